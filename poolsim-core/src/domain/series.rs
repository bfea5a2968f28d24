//! PoolSeries — ordered snapshots for one pool.

use serde::{Deserialize, Serialize};

use super::snapshot::MarketSnapshot;
use super::PoolAddress;

/// A time-ascending sequence of snapshots belonging to one pool.
///
/// The engine requires non-decreasing timestamps; `preprocess::prepare`
/// establishes that invariant for raw input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSeries {
    pub pool_address: PoolAddress,
    pub snapshots: Vec<MarketSnapshot>,
}

impl PoolSeries {
    pub fn new(pool_address: impl Into<PoolAddress>, snapshots: Vec<MarketSnapshot>) -> Self {
        Self {
            pool_address: pool_address.into(),
            snapshots,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MarketSnapshot> {
        self.snapshots.get(index)
    }

    /// Returns true if timestamps are non-decreasing.
    pub fn is_time_ordered(&self) -> bool {
        self.snapshots
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp)
    }
}
