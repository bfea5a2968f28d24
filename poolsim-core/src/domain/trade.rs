//! TradeResult — a completed simulated trade with exit classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::PoolAddress;

/// Why a simulated position was closed.
///
/// Exactly one of these is reached per simulation; `ForceExit` is the
/// default when the post-entry window runs out before any rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    /// Profit target reached, momentum faded and price retraced from peak.
    TakeProfit,
    /// Valuation fell to the stop-loss multiple with no override in effect.
    StopLoss,
    /// Holder growth stalled while the position hovered near break-even.
    LowPerformance,
    /// Post-entry window exhausted without any other rule firing.
    ForceExit,
}

impl ExitReason {
    /// Human-readable label, matching the strings used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            ExitReason::TakeProfit => "Momentum Lost + Price Drop",
            ExitReason::StopLoss => "Stop Loss",
            ExitReason::LowPerformance => "Low Performance",
            ExitReason::ForceExit => "Force Sell",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Retrospective label for how well-timed an exit was, judged by what the
/// price did after the exit. Never used by the exit decision itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitQuality {
    Good,
    Bad,
}

/// A completed round trip: entry → exit, with post-exit validation fields.
///
/// Terminal object — constructed once by the exit state machine and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeResult {
    pub pool_address: PoolAddress,

    // ── Entry ──
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,

    // ── Exit ──
    /// Absolute index into the preprocessed series (entry index + offset
    /// into the post-entry window).
    pub exit_index: usize,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    // ── Outcome ──
    /// exit_price / entry_price.
    pub profit_ratio: f64,
    /// Running maximum of the profit ratio observed during the hold.
    pub peak_profit_ratio: f64,
    pub duration_secs: i64,

    // ── Post-exit validation (quality scoring only) ──
    /// Best valuation ratio (vs exit price) reachable within the bounded
    /// lookahead after the exit bar. 1.0 when nothing follows the exit.
    pub post_exit_max_ratio: f64,
    /// Bars from the exit to that maximum.
    pub post_exit_max_bars: usize,
    pub exit_quality: Option<ExitQuality>,
}

impl TradeResult {
    pub fn is_winner(&self) -> bool {
        self.profit_ratio > 1.0
    }

    /// Profit as a percentage of the entry price.
    pub fn profit_pct(&self) -> f64 {
        (self.profit_ratio - 1.0) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_trade() -> TradeResult {
        let entry = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        TradeResult {
            pool_address: "pool-a".into(),
            entry_index: 60,
            entry_time: entry,
            entry_price: 100_000.0,
            exit_index: 95,
            exit_time: entry + chrono::Duration::seconds(35),
            exit_price: 180_000.0,
            exit_reason: ExitReason::TakeProfit,
            profit_ratio: 1.8,
            peak_profit_ratio: 2.0,
            duration_secs: 35,
            post_exit_max_ratio: 1.1,
            post_exit_max_bars: 12,
            exit_quality: Some(ExitQuality::Good),
        }
    }

    #[test]
    fn winner_and_profit_pct() {
        let trade = sample_trade();
        assert!(trade.is_winner());
        assert!((trade.profit_pct() - 80.0).abs() < 1e-10);
    }

    #[test]
    fn exit_reason_labels() {
        assert_eq!(ExitReason::TakeProfit.label(), "Momentum Lost + Price Drop");
        assert_eq!(ExitReason::StopLoss.label(), "Stop Loss");
        assert_eq!(ExitReason::LowPerformance.label(), "Low Performance");
        assert_eq!(ExitReason::ForceExit.label(), "Force Sell");
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: TradeResult = serde_json::from_str(&json).unwrap();
        assert_eq!(trade.pool_address, deser.pool_address);
        assert_eq!(trade.exit_reason, deser.exit_reason);
        assert_eq!(trade.profit_ratio, deser.profit_ratio);
    }
}
