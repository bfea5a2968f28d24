//! Entry scanner: first index in the delay window where every enabled
//! threshold holds.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::config::{ConfigError, ScanConfig, EARLY_FILTER_OFFSET, LOOKAHEAD_RESERVE};
use crate::domain::{BuyOpportunity, PoolSeries};
use crate::fields::{resolve, Metric};

/// Scans a prepared series for a qualifying entry index.
///
/// The scan is first-fit: indices are tried in ascending order inside the
/// delay window and the first one where every enabled, resolvable
/// threshold holds becomes the entry. Metrics that cannot be resolved at
/// an index are skipped rather than failing it; an index where nothing
/// could be checked never qualifies.
#[derive(Debug, Clone)]
pub struct EntryScanner {
    config: ScanConfig,
    checks: Vec<(Metric, f64)>,
}

impl EntryScanner {
    pub fn new(config: ScanConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let checks = config.thresholds.configured();
        Ok(Self { config, checks })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Find the entry point for one pool, if any.
    pub fn scan(&self, series: &PoolSeries) -> Option<BuyOpportunity> {
        let len = series.len();
        if len < self.config.min_required_len() {
            debug!(
                pool = %series.pool_address,
                len,
                required = self.config.min_required_len(),
                "series too short to scan"
            );
            return None;
        }

        // Pools already pumped shortly after listing are missed entries.
        let probe = EARLY_FILTER_OFFSET.min(len - 1);
        if series.snapshots[probe].market_cap > self.config.early_mc_limit {
            debug!(
                pool = %series.pool_address,
                market_cap = series.snapshots[probe].market_cap,
                limit = self.config.early_mc_limit,
                "rejected by early valuation filter"
            );
            return None;
        }

        let first = &series.snapshots[0];
        let initial_market_cap = first.market_cap;
        let initial_holders = first.holders_count;

        let upper = self.config.max_delay.min(len - LOOKAHEAD_RESERVE);
        for idx in self.config.min_delay..upper {
            let snap = &series.snapshots[idx];
            if !snap.has_sane_valuation() {
                continue;
            }
            let Some(entry_metrics) = self.check_index(series, idx) else {
                continue;
            };

            debug!(pool = %series.pool_address, entry_index = idx, "entry found");
            return Some(BuyOpportunity {
                pool_address: series.pool_address.clone(),
                entry_index: idx,
                entry_time: snap.timestamp,
                entry_price: snap.market_cap,
                entry_metrics,
                initial_market_cap,
                initial_holders,
                post_entry: series.snapshots[idx..].to_vec(),
                theoretical: None,
            });
        }

        trace!(pool = %series.pool_address, "no entry in delay window");
        None
    }

    /// Evaluate every enabled threshold at `idx`. Returns the resolved
    /// values when the index qualifies, `None` otherwise.
    fn check_index(&self, series: &PoolSeries, idx: usize) -> Option<BTreeMap<Metric, f64>> {
        let mut checked = BTreeMap::new();
        for &(metric, threshold) in &self.checks {
            let Some(value) = resolve(series, idx, metric) else {
                continue;
            };
            if value.is_nan() {
                continue;
            }
            if value < threshold {
                trace!(index = idx, %metric, value, threshold, "threshold missed");
                return None;
            }
            checked.insert(metric, value);
        }
        if checked.is_empty() {
            // Nothing was checkable at this index; do not enter blind.
            return None;
        }
        Some(checked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuyThresholds;
    use crate::domain::MarketSnapshot;
    use chrono::{TimeZone, Utc};

    fn snap(secs: i64, mc: f64, holders: f64) -> MarketSnapshot {
        let ts = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
        MarketSnapshot::at(ts, mc, holders)
    }

    /// 260 bars of quiet tape; strong metrics stamped on selected rows.
    fn quiet_series(len: usize) -> PoolSeries {
        let snaps: Vec<_> = (0..len as i64).map(|i| snap(i, 50_000.0, 20.0)).collect();
        PoolSeries::new("pool-a", snaps)
    }

    fn stamp_strong(series: &mut PoolSeries, idx: usize) {
        let s = &mut series.snapshots[idx];
        s.market_cap = 60_000.0;
        s.price_change_percent = Some(2.0);
        s.market_cap_change_5s = Some(8.0);
        s.market_cap_change_30s = Some(15.0);
        s.holder_delta_30s = Some(25.0);
        s.buy_volume_5s = Some(9.0);
        s.net_volume_5s = Some(4.0);
        s.large_buy_5s = Some(2.0);
        s.holders_count = 45.0;
    }

    fn permissive_scanner() -> EntryScanner {
        // Only metrics the test stamps are enabled; the ratio needs the
        // nested breakdown and stays disabled here.
        let mut thresholds = BuyThresholds::default();
        thresholds.buy_sell_ratio_10s = None;
        thresholds.mc_growth_from_start = None;
        thresholds.holder_growth_from_start = None;
        EntryScanner::new(ScanConfig {
            thresholds,
            ..ScanConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn short_series_yields_nothing() {
        let scanner = permissive_scanner();
        // One below the required minimum of max_delay + 10.
        let series = quiet_series(209);
        assert!(scanner.scan(&series).is_none());
    }

    #[test]
    fn early_valuation_filter_rejects_pumped_pools() {
        let scanner = permissive_scanner();
        let mut series = quiet_series(260);
        series.snapshots[EARLY_FILTER_OFFSET].market_cap = 500_000.0;
        stamp_strong(&mut series, 80);
        assert!(scanner.scan(&series).is_none());
    }

    #[test]
    fn first_fit_picks_the_earliest_qualifying_index() {
        let scanner = permissive_scanner();
        let mut series = quiet_series(260);
        stamp_strong(&mut series, 75);
        stamp_strong(&mut series, 120);
        let opp = scanner.scan(&series).unwrap();
        assert_eq!(opp.entry_index, 75);
        assert_eq!(opp.entry_price, 60_000.0);
        assert_eq!(opp.post_entry.len(), 260 - 75);
        assert_eq!(opp.initial_market_cap, 50_000.0);
    }

    #[test]
    fn qualifying_index_before_min_delay_is_ignored() {
        let scanner = permissive_scanner();
        let mut series = quiet_series(260);
        stamp_strong(&mut series, 30);
        assert!(scanner.scan(&series).is_none());
    }

    #[test]
    fn qualifying_index_in_lookahead_reserve_is_ignored() {
        let scanner = permissive_scanner();
        let mut series = quiet_series(210);
        // Window is min_delay..min(200, 210-10) = 60..200; index 205 is out.
        stamp_strong(&mut series, 205);
        assert!(scanner.scan(&series).is_none());
    }

    #[test]
    fn threshold_equality_qualifies() {
        let mut thresholds = BuyThresholds::none();
        thresholds.mc_change_5s = Some(5.0);
        let scanner = EntryScanner::new(ScanConfig {
            thresholds,
            ..ScanConfig::default()
        })
        .unwrap();
        let mut series = quiet_series(260);
        series.snapshots[90].market_cap_change_5s = Some(5.0);
        let opp = scanner.scan(&series).unwrap();
        assert_eq!(opp.entry_index, 90);
        assert_eq!(opp.entry_metrics.get(&Metric::McChange5s), Some(&5.0));
    }

    #[test]
    fn unresolvable_metric_is_skipped_not_failed() {
        let mut thresholds = BuyThresholds::none();
        thresholds.mc_change_5s = Some(5.0);
        thresholds.buy_sell_ratio_10s = Some(1.5);
        let scanner = EntryScanner::new(ScanConfig {
            thresholds,
            ..ScanConfig::default()
        })
        .unwrap();
        let mut series = quiet_series(260);
        // The ratio is unresolvable everywhere (no breakdown data); the
        // mc change alone should still qualify the index.
        series.snapshots[100].market_cap_change_5s = Some(7.0);
        let opp = scanner.scan(&series).unwrap();
        assert_eq!(opp.entry_index, 100);
        assert!(!opp.entry_metrics.contains_key(&Metric::BuySellRatio10s));
    }

    #[test]
    fn index_with_no_checkable_metrics_never_qualifies() {
        let mut thresholds = BuyThresholds::none();
        thresholds.buy_volume_5s = Some(5.0);
        let scanner = EntryScanner::new(ScanConfig {
            thresholds,
            ..ScanConfig::default()
        })
        .unwrap();
        // No bar carries buy volume, so nothing is checkable anywhere.
        let series = quiet_series(260);
        assert!(scanner.scan(&series).is_none());
    }

    #[test]
    fn nan_valuation_bars_are_skipped() {
        let scanner = permissive_scanner();
        let mut series = quiet_series(260);
        stamp_strong(&mut series, 85);
        series.snapshots[85].market_cap = f64::NAN;
        stamp_strong(&mut series, 110);
        let opp = scanner.scan(&series).unwrap();
        assert_eq!(opp.entry_index, 110);
    }

    #[test]
    fn scan_is_deterministic() {
        let scanner = permissive_scanner();
        let mut series = quiet_series(260);
        stamp_strong(&mut series, 95);
        let a = scanner.scan(&series).unwrap();
        let b = scanner.scan(&series).unwrap();
        assert_eq!(a.entry_index, b.entry_index);
        assert_eq!(a.entry_metrics, b.entry_metrics);
    }
}
