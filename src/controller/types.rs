//! Controller error and outcome types.

use thiserror::Error;

use crate::flags::FlagError;
use crate::load_balancer::BalancerError;

/// Errors raised while controlling one application.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A weight was required but the feature is not valid.
    #[error("Feature for {0} is not valid")]
    Configuration(String),

    /// No backend group or server matched.
    #[error("Balancer has no {what} for {app}")]
    BalancerUnavailable { app: String, what: &'static str },

    /// Servers of one pool disagree on their weight.
    #[error("Inconsistent {pool} weights for {app}: {weights:?}")]
    Consistency {
        app: String,
        pool: &'static str,
        weights: Vec<u32>,
    },

    #[error(transparent)]
    Balancer(#[from] BalancerError),

    #[error(transparent)]
    Flag(#[from] FlagError),
}

/// Result type for controller operations.
pub type ControllerResult<T> = Result<T, ControllerError>;

/// What one metrics collection did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    /// A pool group was missing or unreadable; nothing reported.
    Skipped,
    /// Deltas were reported.
    Reported { legacy: u64, new: u64 },
    /// Deltas were computed but the report failed; the window moved on anyway.
    ReportFailed { legacy: u64, new: u64 },
}

/// What one reconcile step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Application or feature not valid this tick.
    Skipped,
    /// Balancer already at the wanted weight.
    InSync,
    /// Weights were changed.
    Adjusted { from: u32, to: u8, changes: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ControllerError::BalancerUnavailable { app: "foo".into(), what: "backend group" };
        assert_eq!(err.to_string(), "Balancer has no backend group for foo");

        let err = ControllerError::Consistency { app: "foo".into(), pool: "legacy", weights: vec![30, 40] };
        assert_eq!(err.to_string(), "Inconsistent legacy weights for foo: [30, 40]");

        let err: ControllerError = BalancerError::NotFound("foo-legacy".into()).into();
        assert_eq!(err.to_string(), "Backend not found: foo-legacy");
    }
}
