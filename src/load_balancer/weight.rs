//! Rollout weight type.

use std::fmt;

use thiserror::Error;

/// Value outside the accepted weight range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("weight {0} is outside 0..=100")]
pub struct WeightOutOfRange(pub i64);

/// Percentage of traffic (0..=100) sent to one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Weight(u8);

impl Weight {
    pub const MAX: Weight = Weight(100);

    pub fn new(value: i64) -> Result<Self, WeightOutOfRange> {
        if (0..=100).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(WeightOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Weight of the opposite pool.
    pub fn complement(self) -> Self {
        Self(100 - self.0)
    }
}

impl TryFrom<i64> for Weight {
    type Error = WeightOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Weight> for u8 {
    fn from(w: Weight) -> Self {
        w.0
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
