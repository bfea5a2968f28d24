//! Exit state machine: walks the post-entry window bar by bar and closes
//! the position on the first rule that fires.

use tracing::{debug, warn};

use crate::config::{
    ConfigError, ExitConfig, LOW_PERF_UPPER, MIN_EXIT_WINDOW, POST_EXIT_LOOKAHEAD,
};
use crate::domain::{BuyOpportunity, ExitQuality, ExitReason, MarketSnapshot, TradeResult};

/// Per-bar metric values the exit rules read. Missing or non-finite
/// values collapse to zero, which makes every rule lean conservative:
/// momentum looks weak, overrides do not apply, holder growth looks
/// stalled.
#[derive(Debug, Clone, Copy)]
struct BarMetrics {
    mc_change_5s: f64,
    holder_delta_30s: f64,
    holder_delta_60s: f64,
    buy_volume_5s: f64,
    net_volume_5s: f64,
}

impl BarMetrics {
    fn from_snapshot(snap: &MarketSnapshot) -> Self {
        let value = |v: Option<f64>| v.filter(|v| v.is_finite()).unwrap_or(0.0);
        Self {
            mc_change_5s: value(snap.market_cap_change_5s),
            holder_delta_30s: value(snap.holder_delta_30s),
            holder_delta_60s: value(snap.holder_delta_60s),
            buy_volume_5s: value(snap.buy_volume_5s),
            net_volume_5s: value(snap.net_volume_5s),
        }
    }
}

/// Simulates the exit strategy over a buy opportunity's post-entry window.
///
/// Rule order per bar: armed take-profit, then the low-performance band,
/// then stop-loss with its overrides; a position still open after the
/// last bar is force-closed. Exactly one reason is reached per trade.
#[derive(Debug, Clone)]
pub struct ExitStateMachine {
    config: ExitConfig,
}

impl ExitStateMachine {
    pub fn new(config: ExitConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExitConfig {
        &self.config
    }

    /// Walk the position through the post-entry window. Returns `None`
    /// when the window is too short or the entry price is unusable.
    pub fn simulate(&self, opp: &BuyOpportunity) -> Option<TradeResult> {
        let window = &opp.post_entry;
        if window.len() < MIN_EXIT_WINDOW {
            warn!(
                pool = %opp.pool_address,
                len = window.len(),
                "post-entry window too short to simulate"
            );
            return None;
        }
        let entry_price = opp.entry_price;
        if !(entry_price.is_finite() && entry_price > 0.0) {
            warn!(pool = %opp.pool_address, entry_price, "unusable entry price");
            return None;
        }

        let mut peak_price = entry_price;
        let mut peak_ratio = 0.0_f64;
        let mut exit: Option<(usize, f64, ExitReason)> = None;

        for (offset, snap) in window.iter().enumerate() {
            if !snap.has_sane_valuation() {
                continue;
            }
            let price = snap.market_cap;
            peak_price = peak_price.max(price);
            let ratio = price / entry_price;
            peak_ratio = peak_ratio.max(ratio);
            let metrics = BarMetrics::from_snapshot(snap);

            if ratio >= self.config.take_profit {
                // Armed: sell only once momentum fades and the price has
                // retraced from its peak.
                let dropped = price < peak_price * self.config.trailing_stop;
                if !self.momentum_is_strong(&metrics) && dropped {
                    exit = Some((offset, price, ExitReason::TakeProfit));
                    break;
                }
            } else if ratio < LOW_PERF_UPPER && ratio > self.config.stop_loss {
                // Near break-even with holder growth stalled on both
                // windows: cut the position before it decays further.
                let lp = self.config.momentum.low_perf_holder_growth;
                if metrics.holder_delta_30s < lp && metrics.holder_delta_60s < lp * 2.0 {
                    exit = Some((offset, price, ExitReason::LowPerformance));
                    break;
                }
            } else if ratio <= self.config.stop_loss {
                if self.stop_loss_overridden(&metrics) {
                    debug!(pool = %opp.pool_address, offset, ratio, "stop loss overridden");
                    continue;
                }
                exit = Some((offset, price, ExitReason::StopLoss));
                break;
            }
        }

        let (exit_offset, exit_price, exit_reason) = match exit {
            Some(e) => e,
            None => force_exit(window)?,
        };

        let exit_snap = &window[exit_offset];
        let profit_ratio = exit_price / entry_price;
        let (post_exit_max_ratio, post_exit_max_bars) =
            post_exit_peak(window, exit_offset, exit_price);

        debug!(
            pool = %opp.pool_address,
            reason = %exit_reason,
            profit_ratio,
            "position closed"
        );

        Some(TradeResult {
            pool_address: opp.pool_address.clone(),
            entry_index: opp.entry_index,
            entry_time: opp.entry_time,
            entry_price,
            exit_index: opp.entry_index + exit_offset,
            exit_time: exit_snap.timestamp,
            exit_price,
            exit_reason,
            profit_ratio,
            peak_profit_ratio: peak_ratio.max(profit_ratio),
            duration_secs: (exit_snap.timestamp - opp.entry_time).num_seconds(),
            post_exit_max_ratio,
            post_exit_max_bars,
            exit_quality: exit_quality(exit_reason, post_exit_max_ratio),
        })
    }

    /// At least `required_strong` of the four momentum conditions hold,
    /// each strictly above its threshold.
    fn momentum_is_strong(&self, m: &BarMetrics) -> bool {
        let t = &self.config.momentum;
        let score = [
            m.mc_change_5s > t.mc_change_5s,
            m.holder_delta_30s > t.holder_change_30s,
            m.buy_volume_5s > t.buy_volume_5s,
            m.net_volume_5s > t.net_volume_5s,
        ]
        .into_iter()
        .filter(|&c| c)
        .count() as u32;
        score >= t.required_strong
    }

    /// Either override tier: holders still flowing in on both windows
    /// while buy volume holds up.
    fn stop_loss_overridden(&self, m: &BarMetrics) -> bool {
        let o = &self.config.stop_loss_override;
        if m.buy_volume_5s <= o.buy_volume_5s {
            return false;
        }
        let strong =
            m.holder_delta_30s > o.strong_holder_30s && m.holder_delta_60s > o.strong_holder_60s;
        let moderate = m.holder_delta_30s > o.moderate_holder_30s
            && m.holder_delta_60s > o.moderate_holder_60s;
        strong || moderate
    }
}

/// Close at the last bar with a usable valuation.
fn force_exit(window: &[MarketSnapshot]) -> Option<(usize, f64, ExitReason)> {
    window
        .iter()
        .enumerate()
        .rev()
        .find(|(_, s)| s.has_sane_valuation())
        .map(|(offset, s)| (offset, s.market_cap, ExitReason::ForceExit))
}

/// Best valuation ratio vs the exit price within the bounded lookahead
/// after the exit bar, and the bar distance to it. (1.0, 0) when nothing
/// usable follows.
fn post_exit_peak(
    window: &[MarketSnapshot],
    exit_offset: usize,
    exit_price: f64,
) -> (f64, usize) {
    let end = (exit_offset + POST_EXIT_LOOKAHEAD).min(window.len());
    let mut best_ratio = 1.0;
    let mut best_bars = 0;
    if exit_price <= 0.0 || !exit_price.is_finite() {
        return (best_ratio, best_bars);
    }
    let mut best_price = f64::NEG_INFINITY;
    for (offset, snap) in window.iter().enumerate().take(end).skip(exit_offset + 1) {
        if !snap.has_sane_valuation() {
            continue;
        }
        if snap.market_cap > best_price {
            best_price = snap.market_cap;
            best_ratio = snap.market_cap / exit_price;
            best_bars = offset - exit_offset;
        }
    }
    (best_ratio, best_bars)
}

/// Retrospective exit grading. Stop-loss exits tolerate a larger rebound
/// before being called bad; forced exits are not graded.
fn exit_quality(reason: ExitReason, post_exit_max_ratio: f64) -> Option<ExitQuality> {
    let limit = match reason {
        ExitReason::StopLoss => 2.0,
        ExitReason::TakeProfit | ExitReason::LowPerformance => 1.5,
        ExitReason::ForceExit => return None,
    };
    Some(if post_exit_max_ratio < limit {
        ExitQuality::Good
    } else {
        ExitQuality::Bad
    })
}
