//! Entry and exit strategy parameters.
//!
//! Every knob carries the default the strategy was tuned with; a config
//! file only needs to name what it changes. Validation happens once, when
//! the scanner or the exit machine is constructed, so the hot loops can
//! assume sane values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fields::Metric;

/// Probe index for the early-valuation filter.
pub const EARLY_FILTER_OFFSET: usize = 5;
/// Bars kept in reserve past the last scannable entry index.
pub const LOOKAHEAD_RESERVE: usize = 10;
/// Minimum post-entry window the exit machine will simulate.
pub const MIN_EXIT_WINDOW: usize = 10;
/// Bars inspected after an exit for quality scoring.
pub const POST_EXIT_LOOKAHEAD: usize = 300;
/// Fraction of the theoretical peak assumed capturable in practice.
pub const REALISTIC_FRACTION: f64 = 0.8;
/// Upper profit-ratio bound of the low-performance exit band.
pub const LOW_PERF_UPPER: f64 = 1.2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("take_profit must be greater than 1.0, got {0}")]
    TakeProfitTooLow(f64),
    #[error("stop_loss must be below 1.0, got {0}")]
    StopLossTooHigh(f64),
    #[error("trailing_stop must be in (0, 1], got {0}")]
    TrailingStopOutOfRange(f64),
    #[error("min_delay ({min}) must not exceed max_delay ({max})")]
    InvalidDelayRange { min: usize, max: usize },
}

/// Entry thresholds. `None` disables a check entirely; `Some(v)` requires
/// the resolved metric to be at least `v` at the candidate index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuyThresholds {
    pub price_change: Option<f64>,
    pub mc_change_5s: Option<f64>,
    pub mc_change_30s: Option<f64>,
    pub holder_delta_30s: Option<f64>,
    pub buy_volume_5s: Option<f64>,
    pub net_volume_5s: Option<f64>,
    pub buy_sell_ratio_10s: Option<f64>,
    pub mc_growth_from_start: Option<f64>,
    pub holder_growth_from_start: Option<f64>,
    pub large_buy_5s: Option<f64>,
}

impl Default for BuyThresholds {
    fn default() -> Self {
        Self {
            price_change: Some(1.0),
            mc_change_5s: Some(5.0),
            mc_change_30s: Some(10.0),
            holder_delta_30s: Some(20.0),
            buy_volume_5s: Some(5.0),
            net_volume_5s: Some(0.0),
            buy_sell_ratio_10s: Some(1.5),
            mc_growth_from_start: Some(10.0),
            holder_growth_from_start: Some(20.0),
            large_buy_5s: Some(1.0),
        }
    }
}

impl BuyThresholds {
    /// The enabled checks as (metric, threshold) pairs, in a fixed order.
    pub fn configured(&self) -> Vec<(Metric, f64)> {
        let pairs = [
            (Metric::PriceChange, self.price_change),
            (Metric::McChange5s, self.mc_change_5s),
            (Metric::McChange30s, self.mc_change_30s),
            (Metric::HolderDelta30s, self.holder_delta_30s),
            (Metric::BuyVolume5s, self.buy_volume_5s),
            (Metric::NetVolume5s, self.net_volume_5s),
            (Metric::BuySellRatio10s, self.buy_sell_ratio_10s),
            (Metric::McGrowthFromStart, self.mc_growth_from_start),
            (Metric::HolderGrowthFromStart, self.holder_growth_from_start),
            (Metric::LargeBuy5s, self.large_buy_5s),
        ];
        pairs
            .into_iter()
            .filter_map(|(m, t)| t.map(|t| (m, t)))
            .collect()
    }

    /// Disable every check. Useful as a base for sweeps over one metric.
    pub fn none() -> Self {
        Self {
            price_change: None,
            mc_change_5s: None,
            mc_change_30s: None,
            holder_delta_30s: None,
            buy_volume_5s: None,
            net_volume_5s: None,
            buy_sell_ratio_10s: None,
            mc_growth_from_start: None,
            holder_growth_from_start: None,
            large_buy_5s: None,
        }
    }
}

/// Parameters of the entry scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub thresholds: BuyThresholds,
    /// Pools already above this valuation shortly after listing are
    /// considered missed and skipped outright.
    pub early_mc_limit: f64,
    /// First index eligible for entry.
    pub min_delay: usize,
    /// Exclusive upper bound on the entry index.
    pub max_delay: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            thresholds: BuyThresholds::default(),
            early_mc_limit: 400_000.0,
            min_delay: 60,
            max_delay: 200,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_delay > self.max_delay {
            return Err(ConfigError::InvalidDelayRange {
                min: self.min_delay,
                max: self.max_delay,
            });
        }
        Ok(())
    }

    /// Shortest series the scanner will consider at all.
    pub fn min_required_len(&self) -> usize {
        self.max_delay + LOOKAHEAD_RESERVE
    }
}

/// Momentum scoring thresholds. A bar is "strong" when at least
/// `required_strong` of the four conditions hold (strictly above).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumThresholds {
    pub mc_change_5s: f64,
    pub holder_change_30s: f64,
    pub buy_volume_5s: f64,
    pub net_volume_5s: f64,
    pub required_strong: u32,
    /// Minimum 30s holder growth for a near-break-even position to keep
    /// being held.
    pub low_perf_holder_growth: f64,
}

impl Default for MomentumThresholds {
    fn default() -> Self {
        Self {
            mc_change_5s: 6.0,
            holder_change_30s: 24.5,
            buy_volume_5s: 13.0,
            net_volume_5s: 3.0,
            required_strong: 1,
            low_perf_holder_growth: 2.0,
        }
    }
}

/// Conditions under which a stop-loss breach is tolerated. Two tiers:
/// either very strong recent holder inflow, or moderate inflow on both
/// windows; both tiers also require sustained buy volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StopLossOverride {
    pub strong_holder_30s: f64,
    pub strong_holder_60s: f64,
    pub moderate_holder_30s: f64,
    pub moderate_holder_60s: f64,
    pub buy_volume_5s: f64,
}

impl Default for StopLossOverride {
    fn default() -> Self {
        Self {
            strong_holder_30s: 10.0,
            strong_holder_60s: 50.0,
            moderate_holder_30s: 20.0,
            moderate_holder_60s: 30.0,
            buy_volume_5s: 15.0,
        }
    }
}

/// Parameters of the exit state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitConfig {
    /// Profit multiple that arms the trailing take-profit.
    pub take_profit: f64,
    /// Loss multiple that triggers the stop (absent an override).
    pub stop_loss: f64,
    /// Fraction of the peak below which an armed take-profit fires.
    pub trailing_stop: f64,
    pub momentum: MomentumThresholds,
    pub stop_loss_override: StopLossOverride,
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            take_profit: 1.9,
            stop_loss: 0.65,
            trailing_stop: 0.9,
            momentum: MomentumThresholds::default(),
            stop_loss_override: StopLossOverride::default(),
        }
    }
}

impl ExitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.take_profit <= 1.0 {
            return Err(ConfigError::TakeProfitTooLow(self.take_profit));
        }
        if self.stop_loss >= 1.0 {
            return Err(ConfigError::StopLossTooHigh(self.stop_loss));
        }
        if !(self.trailing_stop > 0.0 && self.trailing_stop <= 1.0) {
            return Err(ConfigError::TrailingStopOutOfRange(self.trailing_stop));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_enable_ten_checks() {
        let checks = BuyThresholds::default().configured();
        assert_eq!(checks.len(), 10);
        assert!(checks.contains(&(Metric::BuySellRatio10s, 1.5)));
        assert!(checks.contains(&(Metric::NetVolume5s, 0.0)));
    }

    #[test]
    fn disabled_thresholds_are_omitted() {
        let mut thresholds = BuyThresholds::none();
        thresholds.mc_change_5s = Some(8.0);
        let checks = thresholds.configured();
        assert_eq!(checks, vec![(Metric::McChange5s, 8.0)]);
    }

    #[test]
    fn scan_config_defaults_and_length() {
        let cfg = ScanConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.early_mc_limit, 400_000.0);
        assert_eq!(cfg.min_required_len(), 210);
    }

    #[test]
    fn scan_config_rejects_inverted_delays() {
        let cfg = ScanConfig {
            min_delay: 300,
            max_delay: 200,
            ..ScanConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidDelayRange { min: 300, max: 200 })
        ));
    }

    #[test]
    fn exit_config_validation() {
        assert!(ExitConfig::default().validate().is_ok());

        let bad_tp = ExitConfig {
            take_profit: 1.0,
            ..ExitConfig::default()
        };
        assert!(matches!(bad_tp.validate(), Err(ConfigError::TakeProfitTooLow(_))));

        let bad_sl = ExitConfig {
            stop_loss: 1.2,
            ..ExitConfig::default()
        };
        assert!(matches!(bad_sl.validate(), Err(ConfigError::StopLossTooHigh(_))));

        let bad_trail = ExitConfig {
            trailing_stop: 0.0,
            ..ExitConfig::default()
        };
        assert!(matches!(
            bad_trail.validate(),
            Err(ConfigError::TrailingStopOutOfRange(_))
        ));
    }

    #[test]
    fn configs_roundtrip_through_serde_defaults() {
        // A partial document picks up defaults for everything it omits.
        let cfg: ExitConfig = serde_json::from_str(r#"{ "take_profit": 2.5 }"#).unwrap();
        assert_eq!(cfg.take_profit, 2.5);
        assert_eq!(cfg.stop_loss, 0.65);
        assert_eq!(cfg.momentum.required_strong, 1);
    }
}
