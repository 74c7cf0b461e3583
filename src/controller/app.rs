//! Reconciliation state for one application.
//!
//! # Responsibilities
//! - Compare the flag source's legacy weight with the balancer's
//! - Push corrective weights to every routing group of the application
//! - Harvest per-pool response totals and report the deltas
//!
//! # Naming
//! ```text
//! app "foo", legacy suffix "legacy", new suffix "kubernetes":
//!     routing groups  foo, foo-<variant>      (weights are set here)
//!     legacy servers  foo-legacy*             (inside routing groups)
//!     new servers     foo-kubernetes*         (inside routing groups)
//!     pool groups     foo-legacy, foo-kubernetes  (counters are read here)
//! ```
//!
//! # Design Decisions
//! - A routing group must hold at least one of the application's pool
//!   servers; a name match alone is not enough
//! - All servers of one pool are expected to share a weight; the first legacy
//!   server found stands for all of them
//! - Groups are updated one after another with no cross-group atomicity; a
//!   partial update is corrected on the next tick
//! - Servers already at their target weight are left alone

use std::sync::Arc;

use chrono::Utc;

use crate::config::BalancerConfig;
use crate::controller::types::{CollectOutcome, ControllerError, ControllerResult};
use crate::controller::window::MetricsWindow;
use crate::flags::FeatureResolver;
use crate::load_balancer::{BackendGroup, BalancerAdapter, Weight};
use crate::observability::metrics;

/// Controls the legacy/new split of one application.
pub struct AppController {
    name: String,
    feature: FeatureResolver,
    balancer: Arc<dyn BalancerAdapter>,
    legacy_pool: String,
    new_pool: String,
    window: MetricsWindow,
}

impl AppController {
    pub fn new(
        name: impl Into<String>,
        feature: FeatureResolver,
        balancer: Arc<dyn BalancerAdapter>,
        config: &BalancerConfig,
    ) -> Self {
        let name = name.into();
        Self {
            legacy_pool: format!("{}-{}", name, config.legacy_suffix),
            new_pool: format!("{}-{}", name, config.new_suffix),
            name,
            feature,
            balancer,
            window: MetricsWindow::new(Utc::now()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn feature(&self) -> &FeatureResolver {
        &self.feature
    }

    /// Name of the legacy pool group, also the legacy server prefix.
    pub fn legacy_pool(&self) -> &str {
        &self.legacy_pool
    }

    /// Name of the new pool group, also the new server prefix.
    pub fn new_pool(&self) -> &str {
        &self.new_pool
    }

    fn unavailable(&self, what: &'static str) -> ControllerError {
        ControllerError::BalancerUnavailable { app: self.name.clone(), what }
    }

    /// Backend groups that route this application's traffic: groups named
    /// after the application that hold at least one of its pool servers.
    /// Another application whose name starts with `<app>-` owns servers with
    /// other prefixes, so its groups never match.
    pub async fn routing_groups(&self) -> ControllerResult<Vec<BackendGroup>> {
        let groups = self.balancer.backends(&self.name).await?;
        Ok(groups
            .into_iter()
            .filter(|g| g.name != self.legacy_pool && g.name != self.new_pool)
            .filter(|g| g.servers(&self.legacy_pool).chain(g.servers(&self.new_pool)).next().is_some())
            .collect())
    }

    /// Whether the balancer has at least one routing group for this application.
    pub async fn exists(&self) -> bool {
        match self.routing_groups().await {
            Ok(groups) => !groups.is_empty(),
            Err(e) => {
                tracing::warn!(app = %self.name, error = %e, "Failed to look up backends");
                false
            }
        }
    }

    /// Legacy weight requested by the flag source.
    pub async fn wanted_legacy_weight(&mut self) -> ControllerResult<Weight> {
        self.feature
            .current_weight()
            .await
            .ok_or_else(|| ControllerError::Configuration(self.name.clone()))
    }

    /// Legacy weight currently configured on the balancer.
    pub async fn current_legacy_weight(&self) -> ControllerResult<u32> {
        let groups = self.routing_groups().await?;
        self.legacy_weight_in(&groups)
    }

    /// Weight of the first legacy server found in `groups`.
    pub(crate) fn legacy_weight_in(&self, groups: &[BackendGroup]) -> ControllerResult<u32> {
        if groups.is_empty() {
            return Err(self.unavailable("backend group"));
        }
        groups
            .iter()
            .find_map(|g| g.servers(&self.legacy_pool).next())
            .map(|s| s.weight)
            .ok_or_else(|| self.unavailable("legacy server"))
    }

    /// Check that each pool's servers agree on one weight across all groups.
    pub async fn verify_homogeneous(&self) -> ControllerResult<()> {
        let groups = self.routing_groups().await?;
        self.check_homogeneous(&groups)
    }

    pub(crate) fn check_homogeneous(&self, groups: &[BackendGroup]) -> ControllerResult<()> {
        for (pool, prefix) in [("legacy", &self.legacy_pool), ("new", &self.new_pool)] {
            let mut weights: Vec<u32> = groups
                .iter()
                .flat_map(|g| g.servers(prefix))
                .map(|s| s.weight)
                .collect();
            weights.sort_unstable();
            weights.dedup();
            if weights.len() > 1 {
                return Err(ControllerError::Consistency { app: self.name.clone(), pool, weights });
            }
        }
        Ok(())
    }

    /// Whether the application exists on the balancer and its feature is valid.
    pub async fn is_valid(&mut self) -> bool {
        self.exists().await && self.feature.is_valid().await
    }

    /// Set legacy servers to the wanted weight and new servers to its
    /// complement, group by group. Returns the number of weight changes.
    pub async fn reconcile(&mut self) -> ControllerResult<usize> {
        let wanted = self.wanted_legacy_weight().await?;
        let groups = self.routing_groups().await?;
        self.apply(&groups, wanted).await
    }

    /// Push `wanted` onto the servers of a snapshot taken by [`Self::routing_groups`].
    pub(crate) async fn apply(&self, groups: &[BackendGroup], wanted: Weight) -> ControllerResult<usize> {
        let mut changes = 0;
        for group in groups {
            for (prefix, target) in [(&self.legacy_pool, wanted), (&self.new_pool, wanted.complement())] {
                for server in group.servers(prefix) {
                    if server.weight == u32::from(target.get()) {
                        continue;
                    }
                    self.balancer.set_weight(&group.name, &server.name, target).await?;
                    changes += 1;
                }
            }
        }

        if changes > 0 {
            metrics::record_weight_changes(&self.name, changes);
        }
        Ok(changes)
    }

    /// Both pools' response totals from one balancer read, or `None` when
    /// either pool group is missing or the balancer cannot be read.
    async fn pool_totals(&self) -> Option<(u64, u64)> {
        let groups = match self.balancer.groups().await {
            Ok(groups) => groups,
            Err(e) => {
                tracing::warn!(app = %self.name, error = %e, "Failed to read pool counters");
                return None;
            }
        };
        let total = |pool: &str| groups.iter().find(|g| g.name == pool).map(BackendGroup::response_total);
        match (total(&self.legacy_pool), total(&self.new_pool)) {
            (Some(legacy), Some(new)) => Some((legacy, new)),
            _ => {
                tracing::debug!(app = %self.name, "Pool group not found, skipping metrics");
                None
            }
        }
    }

    /// Read both pools' response totals and report the deltas since last time.
    pub async fn collect_metrics(&mut self) -> CollectOutcome {
        let Some((legacy_total, new_total)) = self.pool_totals().await else {
            return CollectOutcome::Skipped;
        };

        let delta = self.window.advance(legacy_total, new_total, Utc::now());
        if delta.rebaselined {
            tracing::info!(app = %self.name, "Pool counters went down, re-baselined");
        }
        match self.feature.report(delta.start, delta.stop, delta.legacy, delta.new).await {
            Ok(()) => {
                tracing::debug!(app = %self.name, legacy = delta.legacy, new = delta.new, "Reported traffic split");
                metrics::record_report(&self.name, "ok");
                CollectOutcome::Reported { legacy: delta.legacy, new: delta.new }
            }
            Err(e) => {
                tracing::warn!(app = %self.name, error = %e, "Failed to report traffic split");
                metrics::record_report(&self.name, "error");
                CollectOutcome::ReportFailed { legacy: delta.legacy, new: delta.new }
            }
        }
    }
}

impl std::fmt::Debug for AppController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppController")
            .field("name", &self.name)
            .field("feature", &self.feature)
            .field("window", &self.window)
            .finish()
    }
}
