//! Application discovery and the reconciliation loop.
//!
//! # Responsibilities
//! - Discover controlled applications from enabled flag names
//! - Keep one AppController per application
//! - Run collect → reconcile → sleep on a fixed cadence
//!
//! # Design Decisions
//! - One logical actor: discovery and ticks run strictly in sequence
//! - Discovery diffs the application set; surviving controllers keep their
//!   metrics window and feature cache
//! - A failing application is logged and skipped, never fatal to the tick
//! - The next tick is the only retry

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::{BalancerConfig, RolloutConfig};
use crate::controller::app::AppController;
use crate::controller::types::{ControllerError, ControllerResult, StepOutcome};
use crate::flags::{FeatureResolver, FlagResult, FlagSource};
use crate::load_balancer::BalancerAdapter;
use crate::observability::metrics;

/// Owns the active applications and drives the loop.
pub struct Orchestrator {
    source: Arc<dyn FlagSource>,
    balancer: Arc<dyn BalancerAdapter>,
    balancer_config: BalancerConfig,
    feature_prefix: String,
    min_refetch: Duration,
    tick_interval: Duration,
    ticks_per_discovery: u32,
    apps: BTreeMap<String, AppController>,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn FlagSource>,
        balancer: Arc<dyn BalancerAdapter>,
        config: &RolloutConfig,
    ) -> Self {
        Self {
            source,
            balancer,
            balancer_config: config.balancer.clone(),
            feature_prefix: config.flags.feature_prefix.clone(),
            min_refetch: Duration::from_secs(config.flags.min_refetch_secs),
            tick_interval: Duration::from_secs(config.controller.tick_interval_secs),
            ticks_per_discovery: config.controller.ticks_per_discovery,
            apps: BTreeMap::new(),
        }
    }

    /// Names of the applications currently under control, sorted.
    pub fn active_apps(&self) -> Vec<&str> {
        self.apps.keys().map(String::as_str).collect()
    }

    pub fn app(&self, name: &str) -> Option<&AppController> {
        self.apps.get(name)
    }

    fn build_app(&self, name: &str) -> AppController {
        let feature = FeatureResolver::new(
            format!("{}{}", self.feature_prefix, name),
            self.source.clone(),
            self.min_refetch,
        );
        AppController::new(name, feature, self.balancer.clone(), &self.balancer_config)
    }

    /// Refresh the application set. Returns whether it changed.
    pub async fn discover(&mut self) -> FlagResult<bool> {
        let features = self.source.list_features().await?;
        let wanted: BTreeSet<String> = features
            .into_iter()
            .filter(|f| f.enabled)
            .filter_map(|f| f.name.strip_prefix(&self.feature_prefix).map(str::to_string))
            .filter(|app| !app.is_empty())
            .collect();

        let current: BTreeSet<String> = self.apps.keys().cloned().collect();
        if wanted == current {
            return Ok(false);
        }

        for removed in current.difference(&wanted) {
            tracing::info!(app = %removed, "Application no longer controlled");
            self.apps.remove(removed);
        }
        for added in wanted.difference(&current) {
            tracing::info!(app = %added, "Application now controlled");
            let app = self.build_app(added);
            self.apps.insert(added.clone(), app);
        }

        metrics::record_active_apps(self.apps.len());
        Ok(true)
    }

    /// One pass over every application: collect metrics, then reconcile.
    pub async fn tick(&mut self) {
        for app in self.apps.values_mut() {
            app.collect_metrics().await;

            if let Err(e) = step(app).await {
                tracing::error!(app = %app.name(), error = %e, "Reconcile failed");
                metrics::record_reconcile_error(app.name());
            }
        }
    }

    /// Run until `shutdown` fires.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            tick_interval_secs = self.tick_interval.as_secs(),
            ticks_per_discovery = self.ticks_per_discovery,
            "Reconciliation loop starting"
        );

        loop {
            if let Err(e) = self.discover().await {
                tracing::warn!(error = %e, "Application discovery failed, keeping current set");
            }

            for _ in 0..self.ticks_per_discovery {
                self.tick().await;

                tokio::select! {
                    _ = tokio::time::sleep(self.tick_interval) => {}
                    _ = shutdown.recv() => {
                        tracing::info!("Reconciliation loop received shutdown signal, exiting");
                        return;
                    }
                }
            }
        }
    }
}

/// Bring one application's balancer weights in line with its feature.
///
/// The balancer is read once; every decision and the corrective writes work
/// from that snapshot.
pub async fn step(app: &mut AppController) -> ControllerResult<StepOutcome> {
    let groups = match app.routing_groups().await {
        Ok(groups) if !groups.is_empty() => groups,
        Ok(_) => {
            tracing::debug!(app = %app.name(), "No routing group on the balancer, skipping");
            return Ok(StepOutcome::Skipped);
        }
        Err(e) => {
            tracing::warn!(app = %app.name(), error = %e, "Failed to look up backends, skipping");
            return Ok(StepOutcome::Skipped);
        }
    };
    let wanted = match app.wanted_legacy_weight().await {
        Ok(wanted) => wanted,
        Err(ControllerError::Configuration(_)) => {
            tracing::debug!(app = %app.name(), "Feature not valid, skipping");
            return Ok(StepOutcome::Skipped);
        }
        Err(e) => return Err(e),
    };

    let current = app.legacy_weight_in(&groups)?;
    metrics::record_wanted_weight(app.name(), wanted.get());
    metrics::record_current_weight(app.name(), current);

    let consistency = app.check_homogeneous(&groups);
    if current == u32::from(wanted.get()) && consistency.is_ok() {
        return Ok(StepOutcome::InSync);
    }
    if let Err(e) = consistency {
        tracing::warn!(app = %app.name(), error = %e, "Pool weights diverged");
    }

    tracing::info!(
        app = %app.name(),
        current,
        wanted = wanted.get(),
        "Adjusting legacy weight"
    );
    let changes = app.apply(&groups, wanted).await?;
    Ok(StepOutcome::Adjusted { from: current, to: wanted.get(), changes })
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("apps", &self.active_apps())
            .field("tick_interval", &self.tick_interval)
            .finish()
    }
}
