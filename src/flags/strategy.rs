//! Rollout strategy dispatch.
//!
//! # Responsibilities
//! - Map a feature's strategy list to a single legacy weight
//! - Keep the evaluation order explicit (first table entry wins)
//!
//! # Design Decisions
//! - An ordered table of (predicate, extractor) pairs, no lookup by reflection
//! - A matching strategy with a missing or non-integer parameter yields no
//!   weight; lower-priority entries are not consulted

use crate::load_balancer::Weight;
use crate::flags::types::Strategy;

/// Strategy name carrying an explicit per-host legacy weight.
pub const LEGACY_HOST: &str = "kubernetesLegacyHost";
/// Strategy name of the flag source's gradual random rollout.
pub const GRADUAL_ROLLOUT_RANDOM: &str = "gradualRolloutRandom";

/// One entry of the dispatch table.
pub struct WeightStrategy {
    pub name: &'static str,
    pub matches: fn(&Strategy) -> bool,
    pub extract: fn(&Strategy) -> Option<i64>,
}

/// Evaluation order, highest priority first.
pub const WEIGHT_STRATEGIES: &[WeightStrategy] = &[
    WeightStrategy {
        name: LEGACY_HOST,
        matches: |s: &Strategy| s.name == LEGACY_HOST,
        extract: |s: &Strategy| s.int_parameter("legacy-weight"),
    },
    WeightStrategy {
        name: GRADUAL_ROLLOUT_RANDOM,
        matches: |s: &Strategy| s.name == GRADUAL_ROLLOUT_RANDOM,
        extract: |s: &Strategy| s.int_parameter("percentage"),
    },
];

/// Names announced to the flag source at registration.
pub fn supported_strategies() -> Vec<String> {
    WEIGHT_STRATEGIES.iter().map(|s| s.name.to_string()).collect()
}

/// Why no weight could be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// No strategy in the table is attached to the feature.
    NoStrategy,
    /// The winning strategy lacks an integer parameter.
    MissingParameter(&'static str),
    /// The winning strategy's value is outside 0..=100.
    OutOfRange(&'static str, i64),
}

/// Resolve the legacy weight from a strategy list.
pub fn resolve_weight(strategies: &[Strategy]) -> Result<Weight, Unresolved> {
    for entry in WEIGHT_STRATEGIES {
        let Some(strategy) = strategies.iter().find(|s| (entry.matches)(s)) else {
            continue;
        };
        let value = (entry.extract)(strategy).ok_or(Unresolved::MissingParameter(entry.name))?;
        return Weight::new(value).map_err(|_| Unresolved::OutOfRange(entry.name, value));
    }
    Err(Unresolved::NoStrategy)
}
