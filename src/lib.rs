//! Legacy/new traffic-split rollout controller.
//!
//! Shifts HTTP traffic between a legacy and a new server pool behind a load
//! balancer, following a rollout weight managed in a remote feature-flag
//! source, and reports the observed split back to that source.

// Core subsystems
pub mod config;
pub mod controller;
pub mod flags;
pub mod load_balancer;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::RolloutConfig;
pub use controller::{AppController, Orchestrator};
pub use flags::{FeatureResolver, FlagSource, HttpFlagClient};
pub use lifecycle::Shutdown;
pub use load_balancer::{BalancerAdapter, HaproxyAdmin, Weight};
