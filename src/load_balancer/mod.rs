//! Load balancer administration.
//!
//! # Data Flow
//! ```text
//! AppController
//!     → BalancerAdapter::backends / backend (read snapshots)
//!     → backend.rs (servers by prefix, response counters)
//!     → BalancerAdapter::set_weight (one server at a time)
//!
//! HAProxy implementation:
//!     haproxy.rs (runtime API over each admin socket)
//!     → stats.rs (parse `show stat` CSV, merge per-process rows)
//! ```
//!
//! # Design Decisions
//! - Reads return owned snapshots; nothing is cached between calls
//! - Writes are per server and never batched across groups
//! - Concurrent external writers are serialized by the balancer itself

pub mod backend;
pub mod haproxy;
pub mod stats;
pub mod weight;

use async_trait::async_trait;
use thiserror::Error;

pub use backend::{BackendGroup, Server, RESPONSE_COUNTERS};
pub use haproxy::HaproxyAdmin;
pub use weight::{Weight, WeightOutOfRange};

/// Errors raised by balancer adapters.
#[derive(Debug, Error)]
pub enum BalancerError {
    /// No backend group with the requested name.
    #[error("Backend not found: {0}")]
    NotFound(String),

    /// Socket could not be reached or read.
    #[error("Balancer I/O error on {socket}: {source}")]
    Io {
        socket: String,
        #[source]
        source: std::io::Error,
    },

    /// Socket exchange exceeded the configured timeout.
    #[error("Balancer command timed out on {0}")]
    Timeout(String),

    /// Balancer refused a command.
    #[error("Balancer rejected '{command}': {reply}")]
    Command { command: String, reply: String },

    /// Statistics output could not be parsed.
    #[error("Malformed balancer stats: {0}")]
    Stats(String),

    /// No administration socket was found.
    #[error("No balancer sockets found in {0}")]
    NoSockets(String),
}

/// Result type for balancer operations.
pub type BalancerResult<T> = Result<T, BalancerError>;

/// Access to the balancer's backend groups and server weights.
#[async_trait]
pub trait BalancerAdapter: Send + Sync {
    /// Snapshot of every backend group.
    async fn groups(&self) -> BalancerResult<Vec<BackendGroup>>;

    /// Set one server's weight.
    async fn set_weight(&self, backend: &str, server: &str, weight: Weight) -> BalancerResult<()>;

    /// Groups belonging to application `name`.
    async fn backends(&self, name: &str) -> BalancerResult<Vec<BackendGroup>> {
        let groups = self.groups().await?;
        Ok(groups.into_iter().filter(|g| g.belongs_to(name)).collect())
    }

    /// The group named exactly `name`.
    async fn backend(&self, name: &str) -> BalancerResult<BackendGroup> {
        self.groups()
            .await?
            .into_iter()
            .find(|g| g.name == name)
            .ok_or_else(|| BalancerError::NotFound(name.to_string()))
    }
}
