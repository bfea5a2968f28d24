//! Aggregate statistics over a batch of completed trades.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use poolsim_core::{ExitReason, TradeResult};

/// Summary of a trade list. All ratios are plain fractions (a 75% win
/// rate is 0.75); profits are percentages of the entry price.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeMetrics {
    pub total_trades: usize,
    pub profitable_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub avg_profit_pct: f64,
    pub avg_hold_secs: f64,

    // ── Exit reason histogram ──
    pub take_profit_exits: usize,
    pub stop_loss_exits: usize,
    pub low_performance_exits: usize,
    pub force_exits: usize,
}

impl TradeMetrics {
    pub fn compute(trades: &[TradeResult]) -> Self {
        if trades.is_empty() {
            return Self::default();
        }

        let total = trades.len();
        let winners = trades.iter().filter(|t| t.is_winner()).count();
        let profit_sum: f64 = trades.iter().map(|t| t.profit_pct()).sum();
        let hold_sum: f64 = trades.iter().map(|t| t.duration_secs as f64).sum();

        let count_reason = |reason: ExitReason| {
            trades.iter().filter(|t| t.exit_reason == reason).count()
        };

        Self {
            total_trades: total,
            profitable_trades: winners,
            losing_trades: total - winners,
            win_rate: winners as f64 / total as f64,
            avg_profit_pct: profit_sum / total as f64,
            avg_hold_secs: hold_sum / total as f64,
            take_profit_exits: count_reason(ExitReason::TakeProfit),
            stop_loss_exits: count_reason(ExitReason::StopLoss),
            low_performance_exits: count_reason(ExitReason::LowPerformance),
            force_exits: count_reason(ExitReason::ForceExit),
        }
    }

    /// Flat key/value view for tabular reports.
    pub fn to_key_values(&self) -> BTreeMap<String, f64> {
        let mut kv = BTreeMap::new();
        kv.insert("total_trades".into(), self.total_trades as f64);
        kv.insert("profitable_trades".into(), self.profitable_trades as f64);
        kv.insert("losing_trades".into(), self.losing_trades as f64);
        kv.insert("win_rate".into(), self.win_rate);
        kv.insert("avg_profit_pct".into(), self.avg_profit_pct);
        kv.insert("avg_hold_secs".into(), self.avg_hold_secs);
        kv.insert("take_profit_exits".into(), self.take_profit_exits as f64);
        kv.insert("stop_loss_exits".into(), self.stop_loss_exits as f64);
        kv.insert(
            "low_performance_exits".into(),
            self.low_performance_exits as f64,
        );
        kv.insert("force_exits".into(), self.force_exits as f64);
        kv
    }
}
