//! Flag-source wire types and error definitions.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to the flag source.
#[derive(Debug, Error)]
pub enum FlagError {
    /// Request could not be sent or timed out.
    #[error("Flag source request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Flag source answered with a non-success status.
    #[error("Flag source returned status {status} for {path}")]
    Status { status: u16, path: String },

    /// Response body was not the expected JSON.
    #[error("Malformed flag source response for {path}: {reason}")]
    Decode { path: String, reason: String },

    /// Base URL could not be joined with an endpoint path.
    #[error("Invalid flag source URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type for flag-source operations.
pub type FlagResult<T> = Result<T, FlagError>;

/// Immutable identity of this controller instance.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    /// Application name announced to the flag source.
    pub app_name: String,
    /// Unique id of this process.
    pub instance_id: String,
    /// Process start time.
    pub started: DateTime<Utc>,
}

impl ClientIdentity {
    pub fn new(app_name: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            instance_id: instance_id.into(),
            started: Utc::now(),
        }
    }
}

/// A rollout strategy attached to a feature.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Strategy {
    pub name: String,
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
}

impl Strategy {
    /// Read an integer parameter. Accepts JSON numbers and numeric strings.
    pub fn int_parameter(&self, key: &str) -> Option<i64> {
        match self.parameters.get(key)? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Body of `GET /features/{name}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FeatureDefinition {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub strategies: Vec<Strategy>,
}

/// One entry of `GET /features/`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureSummary {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
}

/// Body of `GET /features/`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FeatureList {
    #[serde(default)]
    pub features: Vec<FeatureSummary>,
}

/// Body of `POST /client/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub app_name: String,
    pub instance_id: String,
    pub strategies: Vec<String>,
    pub started: String,
    pub interval: u64,
}

/// Yes/no counts for one feature within a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleCount {
    /// Responses served by the legacy pool.
    pub yes: u64,
    /// Responses served by the new pool.
    pub no: u64,
}

/// A reporting window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsBucket {
    pub start: String,
    pub stop: String,
    pub toggles: HashMap<String, ToggleCount>,
}

/// Body of `POST /client/metrics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub app_name: String,
    pub instance_id: String,
    pub bucket: MetricsBucket,
}

/// Format a timestamp as ISO-8601 UTC with a `Z` suffix.
pub fn iso8601(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_iso8601_is_z_suffixed() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        assert_eq!(iso8601(ts), "2024-03-01T12:30:05.000Z");
    }

    #[test]
    fn test_int_parameter_accepts_strings_and_numbers() {
        let strategy: Strategy = serde_json::from_value(serde_json::json!({
            "name": "gradualRolloutRandom",
            "parameters": { "percentage": "25", "other": 7, "bad": "seven", "flag": true }
        }))
        .unwrap();

        assert_eq!(strategy.int_parameter("percentage"), Some(25));
        assert_eq!(strategy.int_parameter("other"), Some(7));
        assert_eq!(strategy.int_parameter("bad"), None);
        assert_eq!(strategy.int_parameter("flag"), None);
        assert_eq!(strategy.int_parameter("missing"), None);
    }

    #[test]
    fn test_registration_uses_camel_case() {
        let reg = Registration {
            app_name: "ctl".into(),
            instance_id: "i-1".into(),
            strategies: vec!["kubernetesLegacyHost".into()],
            started: "2024-01-01T00:00:00.000Z".into(),
            interval: 5,
        };
        let json = serde_json::to_value(&reg).unwrap();
        assert_eq!(json["appName"], "ctl");
        assert_eq!(json["instanceId"], "i-1");
        assert_eq!(json["interval"], 5);
    }

    #[test]
    fn test_error_display() {
        let err = FlagError::Status { status: 503, path: "features/x".into() };
        assert_eq!(err.to_string(), "Flag source returned status 503 for features/x");
    }
}
