//! Feature-flag source integration.
//!
//! # Data Flow
//! ```text
//! Orchestrator / AppController
//!     → feature.rs (throttled refresh, cached weight)
//!     → client.rs (GET features, POST register/metrics)
//!     → strategy.rs (ordered strategy table → Weight)
//! ```
//!
//! # Design Decisions
//! - Fail closed: any fetch or validation problem leaves no weight cached
//! - The client never retries; the next tick is the retry
//! - Instance identity is injected once, never read from globals

pub mod client;
pub mod feature;
pub mod strategy;
pub mod types;

pub use client::{FlagSource, HttpFlagClient};
pub use feature::FeatureResolver;
pub use types::{ClientIdentity, FlagError, FlagResult};
