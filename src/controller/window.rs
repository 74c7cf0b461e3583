//! Per-application traffic reporting window.
//!
//! # Responsibilities
//! - Remember the cumulative response totals last seen for each pool
//! - Turn fresh totals into per-window deltas
//!
//! # Design Decisions
//! - First observation is tracked with an explicit flag, not a zero sentinel;
//!   it re-baselines to the observed totals so the first deltas are zero
//! - A total lower than the stored one means a balancer process restarted;
//!   that pool is re-baselined to the new total and reports zero for the
//!   window, accepting a one-time undercount
//! - The window advances on every observation, whatever happens to the report

use chrono::{DateTime, Utc};

/// Deltas for one closed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDelta {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub legacy: u64,
    pub new: u64,
    /// A pool's total went down and was re-baselined.
    pub rebaselined: bool,
}

#[derive(Debug, Clone)]
pub struct MetricsWindow {
    legacy_total: u64,
    new_total: u64,
    started_at: DateTime<Utc>,
    baselined: bool,
}

impl MetricsWindow {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            legacy_total: 0,
            new_total: 0,
            started_at: now,
            baselined: false,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_baselined(&self) -> bool {
        self.baselined
    }

    /// Close the current window at `now` with the given cumulative totals.
    pub fn advance(&mut self, legacy_total: u64, new_total: u64, now: DateTime<Utc>) -> WindowDelta {
        if !self.baselined {
            self.legacy_total = legacy_total;
            self.new_total = new_total;
            self.baselined = true;
        }

        let delta = WindowDelta {
            start: self.started_at,
            stop: now,
            legacy: legacy_total.saturating_sub(self.legacy_total),
            new: new_total.saturating_sub(self.new_total),
            rebaselined: legacy_total < self.legacy_total || new_total < self.new_total,
        };

        self.legacy_total = legacy_total;
        self.new_total = new_total;
        self.started_at = now;
        delta
    }
}
