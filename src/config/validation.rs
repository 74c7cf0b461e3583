//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, loop cadence > 0)
//! - Check that URLs and addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RolloutConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::RolloutConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single rejected setting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &RolloutConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.flags.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "flags.url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("flags.url", e.to_string())),
    }
    if config.flags.app_name.trim().is_empty() {
        errors.push(ValidationError::new("flags.app_name", "must not be empty"));
    }
    if config.flags.feature_prefix.is_empty() {
        errors.push(ValidationError::new("flags.feature_prefix", "must not be empty"));
    }
    if config.flags.request_timeout_ms == 0 {
        errors.push(ValidationError::new("flags.request_timeout_ms", "must be > 0"));
    }

    if config.balancer.socket_dir.is_empty() {
        errors.push(ValidationError::new("balancer.socket_dir", "must not be empty"));
    }
    if config.balancer.timeout_ms == 0 {
        errors.push(ValidationError::new("balancer.timeout_ms", "must be > 0"));
    }
    if config.balancer.legacy_suffix.is_empty() {
        errors.push(ValidationError::new("balancer.legacy_suffix", "must not be empty"));
    }
    if config.balancer.new_suffix.is_empty() {
        errors.push(ValidationError::new("balancer.new_suffix", "must not be empty"));
    }
    // One suffix being a prefix of the other would put servers in both pools.
    let (legacy, new) = (&config.balancer.legacy_suffix, &config.balancer.new_suffix);
    if !legacy.is_empty() && !new.is_empty() && (legacy.starts_with(new.as_str()) || new.starts_with(legacy.as_str())) {
        errors.push(ValidationError::new(
            "balancer.new_suffix",
            format!("'{}' overlaps legacy suffix '{}'", new, legacy),
        ));
    }

    if config.controller.tick_interval_secs == 0 {
        errors.push(ValidationError::new("controller.tick_interval_secs", "must be > 0"));
    }
    if config.controller.ticks_per_discovery == 0 {
        errors.push(ValidationError::new("controller.ticks_per_discovery", "must be > 0"));
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
