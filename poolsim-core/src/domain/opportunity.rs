//! BuyOpportunity — the entry point selected by the scanner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::snapshot::MarketSnapshot;
use super::PoolAddress;
use crate::fields::Metric;

/// A simulated purchase point: at most one per pool per scan.
///
/// Immutable once constructed. The post-entry window is an owned copy of
/// the series from the entry index onward (entry bar included); downstream
/// stages read it but never modify it. Theoretical returns may be attached
/// once via [`BuyOpportunity::with_returns`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyOpportunity {
    pub pool_address: PoolAddress,
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    /// Valuation at the entry snapshot ("entry price").
    pub entry_price: f64,
    /// The resolved metric values that were checked at the entry index.
    pub entry_metrics: BTreeMap<Metric, f64>,
    /// Valuation and holder count at the first row of the series, kept for
    /// growth-from-start context in reports.
    pub initial_market_cap: f64,
    pub initial_holders: f64,
    /// The series from the entry index onward, owned by this opportunity.
    pub post_entry: Vec<MarketSnapshot>,
    /// Entry-side theoretical returns, attached after construction.
    #[serde(default)]
    pub theoretical: Option<TheoreticalReturns>,
}

impl BuyOpportunity {
    /// Attach theoretical returns. The only post-construction mutation the
    /// opportunity admits.
    pub fn with_returns(mut self, returns: TheoreticalReturns) -> Self {
        self.theoretical = Some(returns);
        self
    }
}

/// What was possible after entry, independent of what the exit strategy
/// actually achieved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TheoreticalReturns {
    /// Highest valuation anywhere in the post-entry window.
    pub max_price: f64,
    /// max_price / entry_price.
    pub max_return: f64,
    /// Discounted return assuming an exit at a fixed fraction of the peak.
    pub realistic_return: f64,
    /// Bars from entry to the maximum.
    pub bars_to_max: usize,
    /// Seconds from entry to the maximum.
    pub secs_to_max: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn returns_attach_once() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let opp = BuyOpportunity {
            pool_address: "pool-a".into(),
            entry_index: 60,
            entry_time: ts,
            entry_price: 100_000.0,
            entry_metrics: BTreeMap::new(),
            initial_market_cap: 40_000.0,
            initial_holders: 25.0,
            post_entry: vec![MarketSnapshot::at(ts, 100_000.0, 80.0)],
            theoretical: None,
        };
        let opp = opp.with_returns(TheoreticalReturns {
            max_price: 250_000.0,
            max_return: 2.5,
            realistic_return: 2.0,
            bars_to_max: 40,
            secs_to_max: 40,
        });
        assert!((opp.theoretical.unwrap().max_return - 2.5).abs() < 1e-10);
    }

    #[test]
    fn opportunity_serialization_roundtrip() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut metrics = BTreeMap::new();
        metrics.insert(Metric::McGrowthFromStart, 150.0);
        metrics.insert(Metric::BuyVolume5s, 12.0);
        let opp = BuyOpportunity {
            pool_address: "pool-a".into(),
            entry_index: 72,
            entry_time: ts,
            entry_price: 90_000.0,
            entry_metrics: metrics,
            initial_market_cap: 30_000.0,
            initial_holders: 15.0,
            post_entry: vec![MarketSnapshot::at(ts, 90_000.0, 60.0)],
            theoretical: None,
        };
        let json = serde_json::to_string(&opp).unwrap();
        let deser: BuyOpportunity = serde_json::from_str(&json).unwrap();
        assert_eq!(deser.entry_index, 72);
        assert_eq!(deser.entry_metrics.len(), 2);
        assert_eq!(
            deser.entry_metrics.get(&Metric::McGrowthFromStart),
            Some(&150.0)
        );
    }
}
