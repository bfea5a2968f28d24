//! Series preparation: ordering and gap-filling derived metrics.
//!
//! Raw collector output arrives roughly once per second but with no
//! ordering guarantee and with the short-window change columns only
//! sporadically populated. `prepare` establishes time order; the
//! `derive_*` functions fill missing change columns from index lags,
//! never overwriting a value the collector recorded itself.

use tracing::warn;

use crate::domain::PoolSeries;

/// Index lags for which change columns exist on the snapshot.
pub const STANDARD_WINDOWS: [usize; 4] = [5, 10, 30, 60];

/// Sort snapshots by timestamp, keeping the original relative order of
/// equal timestamps.
pub fn prepare(series: &mut PoolSeries) {
    series.snapshots.sort_by_key(|s| s.timestamp);
}

/// Fill the `window`-lag valuation change and holder delta wherever they
/// are missing. Rows closer than `window` to the start have no prior row
/// and stay `None`. Windows without a matching column are ignored with a
/// warning.
pub fn derive_window_metrics(series: &mut PoolSeries, window: usize) {
    if !STANDARD_WINDOWS.contains(&window) {
        warn!(window, "no change columns for this window, skipping");
        return;
    }

    // Read pass first: the write pass below borrows the rows mutably.
    let basics: Vec<(f64, f64)> = series
        .snapshots
        .iter()
        .map(|s| (s.market_cap, s.holders_count))
        .collect();

    for (idx, snap) in series.snapshots.iter_mut().enumerate() {
        let Some(prior_idx) = idx.checked_sub(window) else {
            continue;
        };
        let (prior_mc, prior_holders) = basics[prior_idx];

        let mc_change = if prior_mc > 0.0 && prior_mc.is_finite() && snap.market_cap.is_finite() {
            Some((snap.market_cap / prior_mc - 1.0) * 100.0)
        } else {
            None
        };
        let holder_delta = Some(snap.holders_count - prior_holders);

        match window {
            5 => {
                snap.market_cap_change_5s = snap.market_cap_change_5s.or(mc_change);
                snap.holder_delta_5s = snap.holder_delta_5s.or(holder_delta);
            }
            10 => {
                snap.market_cap_change_10s = snap.market_cap_change_10s.or(mc_change);
                snap.holder_delta_10s = snap.holder_delta_10s.or(holder_delta);
            }
            30 => {
                snap.market_cap_change_30s = snap.market_cap_change_30s.or(mc_change);
                snap.holder_delta_30s = snap.holder_delta_30s.or(holder_delta);
            }
            60 => {
                snap.market_cap_change_60s = snap.market_cap_change_60s.or(mc_change);
                snap.holder_delta_60s = snap.holder_delta_60s.or(holder_delta);
            }
            _ => unreachable!("window validated against STANDARD_WINDOWS"),
        }
    }
}

/// Fill all standard-window change columns.
pub fn derive_standard_metrics(series: &mut PoolSeries) {
    for window in STANDARD_WINDOWS {
        derive_window_metrics(series, window);
    }
}
