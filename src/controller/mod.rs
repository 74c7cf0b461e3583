//! Rollout control subsystem.
//!
//! # Data Flow
//! ```text
//! orchestrator.rs
//!     → discover: enabled flags with the prefix → application set
//!     → tick, per application (app.rs):
//!         collect_metrics → window.rs deltas → feature report
//!         step: valid? → wanted vs current → reconcile
//!     → sleep, repeat; rediscover every N ticks
//! ```
//!
//! # Design Decisions
//! - No concurrency inside the loop; each call is awaited in order
//! - Errors stay per application
//! - Reconcile only writes servers that differ from their target

pub mod app;
pub mod orchestrator;
pub mod types;
pub mod window;

pub use app::AppController;
pub use orchestrator::{step, Orchestrator};
pub use types::{CollectOutcome, ControllerError, ControllerResult, StepOutcome};
pub use window::{MetricsWindow, WindowDelta};
