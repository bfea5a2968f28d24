//! MarketSnapshot — one timestamped observation of a pool's market state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single observation of a pool at one point in time.
///
/// `market_cap` is the primary valuation metric; every entry/exit decision
/// is priced in it. The short-window deltas and volumes are optional: the
/// upstream collector populates them when it can, and the preprocessor
/// fills the gaps it can derive. `None` means "not available", which the
/// scanner and the exit machine interpret differently (see their docs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub timestamp: DateTime<Utc>,
    pub market_cap: f64,
    pub holders_count: f64,

    // ── Valuation percent changes over fixed index lags ──
    #[serde(default)]
    pub market_cap_change_5s: Option<f64>,
    #[serde(default)]
    pub market_cap_change_10s: Option<f64>,
    #[serde(default)]
    pub market_cap_change_30s: Option<f64>,
    #[serde(default)]
    pub market_cap_change_60s: Option<f64>,

    // ── Holder count deltas over fixed index lags ──
    #[serde(default)]
    pub holder_delta_5s: Option<f64>,
    #[serde(default)]
    pub holder_delta_10s: Option<f64>,
    #[serde(default)]
    pub holder_delta_30s: Option<f64>,
    #[serde(default)]
    pub holder_delta_60s: Option<f64>,

    // ── Short-window volumes ──
    #[serde(default)]
    pub buy_volume_5s: Option<f64>,
    #[serde(default)]
    pub buy_volume_10s: Option<f64>,
    #[serde(default)]
    pub net_volume_5s: Option<f64>,
    #[serde(default)]
    pub net_volume_10s: Option<f64>,

    // ── Price change and sized-buy counters ──
    #[serde(default)]
    pub price_change_percent: Option<f64>,
    #[serde(default)]
    pub large_buy_5s: Option<f64>,
    #[serde(default)]
    pub big_buy_5s: Option<f64>,
    #[serde(default)]
    pub super_buy_5s: Option<f64>,

    /// Nested per-side trade classification, when the collector recorded it.
    /// Only the 10s sell volume participates in engine decisions (as the
    /// denominator of the derived buy/sell ratio).
    #[serde(default)]
    pub trade_breakdown: Option<TradeBreakdown>,
}

impl MarketSnapshot {
    /// A snapshot with only the identity fields set; all derived metrics
    /// absent. The usual starting point for collectors and tests.
    pub fn at(timestamp: DateTime<Utc>, market_cap: f64, holders_count: f64) -> Self {
        Self {
            timestamp,
            market_cap,
            holders_count,
            market_cap_change_5s: None,
            market_cap_change_10s: None,
            market_cap_change_30s: None,
            market_cap_change_60s: None,
            holder_delta_5s: None,
            holder_delta_10s: None,
            holder_delta_30s: None,
            holder_delta_60s: None,
            buy_volume_5s: None,
            buy_volume_10s: None,
            net_volume_5s: None,
            net_volume_10s: None,
            price_change_percent: None,
            large_buy_5s: None,
            big_buy_5s: None,
            super_buy_5s: None,
            trade_breakdown: None,
        }
    }

    /// Returns true if the valuation is a usable number.
    pub fn has_sane_valuation(&self) -> bool {
        self.market_cap.is_finite() && self.market_cap > 0.0
    }
}

/// Buy/sell split of a volume figure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SideVolume {
    pub buy: f64,
    pub sell: f64,
}

/// Buy/sell split of a trade count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SideCount {
    pub buy: u64,
    pub sell: u64,
}

/// Trade activity within one short window, broken out by side and size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TradeWindow {
    pub volume: SideVolume,
    pub count: SideCount,
    /// Buy-side counters by trade size class.
    #[serde(default)]
    pub large_buys: u64,
    #[serde(default)]
    pub big_buys: u64,
    #[serde(default)]
    pub super_buys: u64,
}

/// Nested trade-classification data for the 5s and 10s windows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TradeBreakdown {
    #[serde(default)]
    pub last_5s: Option<TradeWindow>,
    #[serde(default)]
    pub last_10s: Option<TradeWindow>,
}
