//! Per-application rollout feature with a throttled cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::load_balancer::Weight;
use crate::flags::client::FlagSource;
use crate::flags::strategy::{resolve_weight, Unresolved};
use crate::flags::types::{FlagResult, ToggleCount};

/// Resolves and caches the legacy weight for one feature.
///
/// Every read refreshes first; refreshes closer together than `min_refetch`
/// reuse the cached state. Any failure clears the cached weight, and the
/// feature counts as valid only while a weight is cached.
pub struct FeatureResolver {
    name: String,
    source: Arc<dyn FlagSource>,
    min_refetch: Duration,
    last_fetched_at: Option<Instant>,
    cached: Option<Weight>,
}

impl FeatureResolver {
    pub fn new(name: impl Into<String>, source: Arc<dyn FlagSource>, min_refetch: Duration) -> Self {
        Self {
            name: name.into(),
            source,
            min_refetch,
            last_fetched_at: None,
            cached: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Refetch the feature unless the last attempt is still fresh.
    pub async fn refresh(&mut self) {
        if let Some(at) = self.last_fetched_at {
            if at.elapsed() < self.min_refetch {
                return;
            }
        }
        self.last_fetched_at = Some(Instant::now());

        let previous = self.cached;
        self.cached = match self.source.fetch_feature(&self.name).await {
            Ok(definition) if !definition.enabled => {
                tracing::debug!(feature = %self.name, "Feature disabled");
                None
            }
            Ok(definition) => match resolve_weight(&definition.strategies) {
                Ok(weight) => Some(weight),
                Err(reason) => {
                    log_unresolved(&self.name, &reason);
                    None
                }
            },
            Err(e) => {
                tracing::warn!(feature = %self.name, error = %e, "Failed to fetch feature");
                None
            }
        };

        if previous != self.cached {
            tracing::info!(
                feature = %self.name,
                previous = ?previous.map(Weight::get),
                current = ?self.cached.map(Weight::get),
                "Feature weight changed"
            );
        }
    }

    /// Current legacy weight, if the feature is valid.
    pub async fn current_weight(&mut self) -> Option<Weight> {
        self.refresh().await;
        self.cached
    }

    pub async fn is_valid(&mut self) -> bool {
        self.refresh().await;
        self.cached.is_some()
    }

    /// Post the counts observed in `[start, stop)`.
    pub async fn report(
        &self,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        legacy_delta: u64,
        new_delta: u64,
    ) -> FlagResult<()> {
        let counts = ToggleCount { yes: legacy_delta, no: new_delta };
        self.source.send_metrics(&self.name, start, stop, counts).await
    }
}

fn log_unresolved(feature: &str, reason: &Unresolved) {
    match reason {
        Unresolved::NoStrategy => {
            tracing::warn!(feature = %feature, "Feature has no supported strategy")
        }
        Unresolved::MissingParameter(strategy) => {
            tracing::warn!(feature = %feature, strategy = %strategy, "Strategy parameter missing or not an integer")
        }
        Unresolved::OutOfRange(strategy, value) => {
            tracing::warn!(feature = %feature, strategy = %strategy, value, "Strategy weight out of range")
        }
    }
}

impl std::fmt::Debug for FeatureResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureResolver")
            .field("name", &self.name)
            .field("cached", &self.cached)
            .finish()
    }
}
