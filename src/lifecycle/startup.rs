//! Startup orchestration.
//!
//! # Responsibilities
//! - Derive the instance identity
//! - Build the flag client and balancer adapter from configuration
//! - Register with the flag source before the loop starts
//!
//! # Design Decisions
//! - Fail fast: a registration failure is fatal
//! - Identity is built once here and passed down, never read globally

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::RolloutConfig;
use crate::controller::Orchestrator;
use crate::flags::strategy::supported_strategies;
use crate::flags::{ClientIdentity, FlagError, FlagSource, HttpFlagClient};
use crate::load_balancer::HaproxyAdmin;

/// Errors that stop the controller before the loop starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to build flag client: {0}")]
    Client(#[source] FlagError),

    #[error("Registration with flag source failed: {0}")]
    Register(#[source] FlagError),
}

/// Instance id from configuration, the host name, or a random UUID.
pub fn instance_id(config: &RolloutConfig) -> String {
    config
        .flags
        .instance_id
        .clone()
        .filter(|id| !id.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok().filter(|h| !h.is_empty()))
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Announce this instance to the flag source.
pub async fn register(source: &dyn FlagSource, config: &RolloutConfig) -> Result<(), StartupError> {
    let interval = Duration::from_secs(config.controller.tick_interval_secs);
    source
        .register(supported_strategies(), interval)
        .await
        .map_err(StartupError::Register)
}

/// Build every collaborator and register. The returned orchestrator is ready to run.
pub async fn bootstrap(config: &RolloutConfig) -> Result<Orchestrator, StartupError> {
    let identity = ClientIdentity::new(config.flags.app_name.clone(), instance_id(config));
    tracing::info!(
        app_name = %identity.app_name,
        instance_id = %identity.instance_id,
        flags_url = %config.flags.url,
        "Bootstrapping controller"
    );

    let client = HttpFlagClient::new(&config.flags, identity).map_err(StartupError::Client)?;
    register(&client, config).await?;
    tracing::info!("Registered with flag source");

    let balancer = HaproxyAdmin::new(&config.balancer);
    tracing::info!(socket_dir = %config.balancer.socket_dir, "Balancer adapter ready");

    Ok(Orchestrator::new(Arc::new(client), Arc::new(balancer), config))
}
