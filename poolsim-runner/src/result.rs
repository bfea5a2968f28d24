//! Batch output: everything one run over a set of pools produced.

use serde::{Deserialize, Serialize};

use poolsim_core::{BuyOpportunity, TradeResult};

use crate::metrics::TradeMetrics;

/// A pool that could not be processed, with the reason flattened to a
/// string so the batch result stays serializable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolFailure {
    pub pool_address: String,
    pub error: String,
}

/// Complete output of one batch run.
///
/// `scanned_pools + skipped_pools + failures.len()` accounts for every
/// input pool; trades are a subset of opportunities (a found entry whose
/// post-entry window is too short yields no trade).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    pub run_id: String,
    pub opportunities: Vec<BuyOpportunity>,
    pub trades: Vec<TradeResult>,
    pub metrics: TradeMetrics,
    /// Pools long enough to be scanned, whether or not an entry was found.
    pub scanned_pools: usize,
    /// Pools below the minimum length for scanning.
    pub skipped_pools: usize,
    pub failures: Vec<PoolFailure>,
}

impl BatchResult {
    /// Fraction of scanned pools that produced an entry.
    pub fn opportunity_rate(&self) -> f64 {
        if self.scanned_pools == 0 {
            return 0.0;
        }
        self.opportunities.len() as f64 / self.scanned_pools as f64
    }
}
