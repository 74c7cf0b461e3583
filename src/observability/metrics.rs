//! Controller self-metrics.
//!
//! # Responsibilities
//! - Expose a Prometheus-compatible endpoint when enabled
//! - Record the controller's own decisions per application
//!
//! # Metrics
//! - `rollout_wanted_legacy_weight` (gauge): weight requested by the flag source
//! - `rollout_current_legacy_weight` (gauge): weight read from the balancer
//! - `rollout_weight_changes_total` (counter): server weight mutations issued
//! - `rollout_reconcile_errors_total` (counter): failed reconcile steps
//! - `rollout_reports_total` (counter): usage reports by outcome
//! - `rollout_active_apps` (gauge): applications under control
//!
//! Traffic counts themselves are forwarded to the flag source, not kept here.
//! Without an installed recorder every call below is a no-op.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_wanted_weight(app: &str, weight: u8) {
    gauge!("rollout_wanted_legacy_weight", "app" => app.to_owned()).set(f64::from(weight));
}

pub fn record_current_weight(app: &str, weight: u32) {
    gauge!("rollout_current_legacy_weight", "app" => app.to_owned()).set(f64::from(weight));
}

pub fn record_weight_changes(app: &str, changes: usize) {
    counter!("rollout_weight_changes_total", "app" => app.to_owned()).increment(changes as u64);
}

pub fn record_reconcile_error(app: &str) {
    counter!("rollout_reconcile_errors_total", "app" => app.to_owned()).increment(1);
}

pub fn record_report(app: &str, outcome: &'static str) {
    counter!("rollout_reports_total", "app" => app.to_owned(), "outcome" => outcome).increment(1);
}

pub fn record_active_apps(count: usize) {
    gauge!("rollout_active_apps").set(count as f64);
}
