//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RolloutConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables overriding file settings.
pub const ENV_FLAGS_URL: &str = "ROLLOUT_FLAGS_URL";
pub const ENV_FLAGS_TOKEN: &str = "ROLLOUT_FLAGS_TOKEN";
pub const ENV_SOCKET_DIR: &str = "ROLLOUT_SOCKET_DIR";
pub const ENV_INSTANCE_ID: &str = "ROLLOUT_INSTANCE_ID";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load a TOML file, apply environment overrides, and validate.
pub fn load_config(path: &Path) -> Result<RolloutConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: RolloutConfig = toml::from_str(&content)?;
    finish(config, |key| std::env::var(key).ok())
}

/// Defaults plus environment overrides, validated. Used when no file is given.
pub fn load_from_env() -> Result<RolloutConfig, ConfigError> {
    finish(RolloutConfig::default(), |key| std::env::var(key).ok())
}

fn finish<F>(mut config: RolloutConfig, lookup: F) -> Result<RolloutConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    apply_overrides(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment-style overrides from `lookup`.
pub fn apply_overrides<F>(config: &mut RolloutConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_FLAGS_URL) {
        config.flags.url = url;
    }
    if let Some(token) = lookup(ENV_FLAGS_TOKEN) {
        config.flags.api_token = Some(token);
    }
    if let Some(dir) = lookup(ENV_SOCKET_DIR) {
        config.balancer.socket_dir = dir;
    }
    if let Some(id) = lookup(ENV_INSTANCE_ID) {
        config.flags.instance_id = Some(id);
    }
}
