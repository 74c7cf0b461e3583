//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Flag client, balancer adapter, controllers:
//!     → logging.rs (structured log events)
//!     → metrics.rs (controller gauges and counters)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Every log line about an application carries an `app` field
//! - Metrics are cheap and optional; nothing depends on them being installed

pub mod logging;
pub mod metrics;
