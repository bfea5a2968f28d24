//! Canonical metric resolver.
//!
//! Historical data sources named the same fields under several conventions
//! (`marketCapChange5s`, `market_cap_change_5s`, `mc_change_5s`, plus
//! assorted case slips). All of that is resolved here, once, at the
//! data-provider boundary: the simulation core only ever sees [`Metric`]
//! values and never performs alias matching itself.

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::{MarketSnapshot, PoolSeries};

/// Every metric the engine can check, under one canonical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    MarketCap,
    HoldersCount,
    McChange5s,
    McChange10s,
    McChange30s,
    McChange60s,
    HolderDelta5s,
    HolderDelta10s,
    HolderDelta30s,
    HolderDelta60s,
    BuyVolume5s,
    BuyVolume10s,
    NetVolume5s,
    NetVolume10s,
    PriceChange,
    LargeBuy5s,
    BigBuy5s,
    SuperBuy5s,
    /// Derived: 10s buy volume over 10s sell volume.
    BuySellRatio10s,
    /// Derived: valuation growth vs the first row of the series, percent.
    McGrowthFromStart,
    /// Derived: holder count delta vs the first row of the series.
    HolderGrowthFromStart,
}

impl Metric {
    /// Canonical snake_case key for serialization and reports.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Metric::MarketCap => "market_cap",
            Metric::HoldersCount => "holders_count",
            Metric::McChange5s => "mc_change_5s",
            Metric::McChange10s => "mc_change_10s",
            Metric::McChange30s => "mc_change_30s",
            Metric::McChange60s => "mc_change_60s",
            Metric::HolderDelta5s => "holder_delta_5s",
            Metric::HolderDelta10s => "holder_delta_10s",
            Metric::HolderDelta30s => "holder_delta_30s",
            Metric::HolderDelta60s => "holder_delta_60s",
            Metric::BuyVolume5s => "buy_volume_5s",
            Metric::BuyVolume10s => "buy_volume_10s",
            Metric::NetVolume5s => "net_volume_5s",
            Metric::NetVolume10s => "net_volume_10s",
            Metric::PriceChange => "price_change",
            Metric::LargeBuy5s => "large_buy_5s",
            Metric::BigBuy5s => "big_buy_5s",
            Metric::SuperBuy5s => "super_buy_5s",
            Metric::BuySellRatio10s => "buy_sell_ratio_10s",
            Metric::McGrowthFromStart => "mc_growth_from_start",
            Metric::HolderGrowthFromStart => "holder_growth_from_start",
        }
    }

    /// Map any known historical alias to its canonical metric.
    ///
    /// Matching is case-insensitive and underscore-insensitive, which
    /// collapses camelCase, snake_case and the observed case slips
    /// (`market_Cap`, `MarketCap`, ...) into one lookup.
    pub fn from_alias(name: &str) -> Option<Metric> {
        let key: String = name
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let metric = match key.as_str() {
            "marketcap" => Metric::MarketCap,
            "holderscount" | "holders" => Metric::HoldersCount,
            "marketcapchange5s" | "mcchange5s" => Metric::McChange5s,
            "marketcapchange10s" | "mcchange10s" => Metric::McChange10s,
            "marketcapchange30s" | "mcchange30s" => Metric::McChange30s,
            "marketcapchange60s" | "mcchange60s" => Metric::McChange60s,
            "holderdelta5s" => Metric::HolderDelta5s,
            "holderdelta10s" => Metric::HolderDelta10s,
            "holderdelta30s" => Metric::HolderDelta30s,
            "holderdelta60s" => Metric::HolderDelta60s,
            "buyvolume5s" => Metric::BuyVolume5s,
            "buyvolume10s" => Metric::BuyVolume10s,
            "netvolume5s" => Metric::NetVolume5s,
            "netvolume10s" => Metric::NetVolume10s,
            "pricechange" | "pricechangepercent" | "pricepercent" => Metric::PriceChange,
            "largebuy5s" => Metric::LargeBuy5s,
            "bigbuy5s" => Metric::BigBuy5s,
            "superbuy5s" => Metric::SuperBuy5s,
            "buysellratio10s" => Metric::BuySellRatio10s,
            "mcgrowthfromstart" | "marketcapgrowthfromstart" => Metric::McGrowthFromStart,
            "holdergrowthfromstart" | "holdersgrowthfromstart" => Metric::HolderGrowthFromStart,
            _ => return None,
        };
        Some(metric)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::from_alias(s).ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// Error for a metric name with no canonical mapping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric name: '{0}'")]
pub struct UnknownMetric(pub String);

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.canonical_name())
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MetricVisitor;

        impl Visitor<'_> for MetricVisitor {
            type Value = Metric;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a metric name in any known naming convention")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Metric, E> {
                Metric::from_alias(v).ok_or_else(|| E::custom(UnknownMetric(v.to_string())))
            }
        }

        deserializer.deserialize_str(MetricVisitor)
    }
}

/// Typed accessor: the value of `metric` at `index` of `series`.
///
/// Stored fields are read directly; the derived metrics fall back to a
/// calculation (growth vs row 0, buy/sell ratio from the nested
/// breakdown). Returns `None` when the value is genuinely unresolvable —
/// the caller decides whether that means "skip" (scanner) or "zero"
/// (exit machine).
pub fn resolve(series: &PoolSeries, index: usize, metric: Metric) -> Option<f64> {
    let snap = series.get(index)?;
    match metric {
        Metric::MarketCap => Some(snap.market_cap),
        Metric::HoldersCount => Some(snap.holders_count),
        Metric::McChange5s => snap.market_cap_change_5s,
        Metric::McChange10s => snap.market_cap_change_10s,
        Metric::McChange30s => snap.market_cap_change_30s,
        Metric::McChange60s => snap.market_cap_change_60s,
        Metric::HolderDelta5s => snap.holder_delta_5s,
        Metric::HolderDelta10s => snap.holder_delta_10s,
        Metric::HolderDelta30s => snap.holder_delta_30s,
        Metric::HolderDelta60s => snap.holder_delta_60s,
        Metric::BuyVolume5s => snap.buy_volume_5s,
        Metric::BuyVolume10s => snap.buy_volume_10s,
        Metric::NetVolume5s => snap.net_volume_5s,
        Metric::NetVolume10s => snap.net_volume_10s,
        Metric::PriceChange => snap.price_change_percent,
        Metric::LargeBuy5s => snap.large_buy_5s,
        Metric::BigBuy5s => snap.big_buy_5s,
        Metric::SuperBuy5s => snap.super_buy_5s,
        Metric::BuySellRatio10s => buy_sell_ratio_10s(snap),
        Metric::McGrowthFromStart => mc_growth_from_start(series, snap),
        Metric::HolderGrowthFromStart => {
            let first = series.get(0)?;
            Some(snap.holders_count - first.holders_count)
        }
    }
}

/// 10s buy volume over 10s sell volume. Infinite when there were buys but
/// no sells; unresolvable when either side is missing.
fn buy_sell_ratio_10s(snap: &MarketSnapshot) -> Option<f64> {
    let buy = snap.buy_volume_10s?;
    let sell = snap.trade_breakdown?.last_10s?.volume.sell;
    if sell > 0.0 {
        Some(buy / sell)
    } else {
        Some(f64::INFINITY)
    }
}

/// Percent growth of the valuation vs the first row. Zero when the first
/// row's valuation is unusable (neutral, never a threshold pass).
fn mc_growth_from_start(series: &PoolSeries, snap: &MarketSnapshot) -> Option<f64> {
    let first = series.get(0)?;
    if first.market_cap > 0.0 && first.market_cap.is_finite() {
        Some((snap.market_cap / first.market_cap - 1.0) * 100.0)
    } else {
        Some(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SideCount, SideVolume, TradeBreakdown, TradeWindow};
    use chrono::{TimeZone, Utc};

    fn snap(secs: i64, mc: f64, holders: f64) -> MarketSnapshot {
        let ts = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
        MarketSnapshot::at(ts, mc, holders)
    }

    #[test]
    fn alias_resolution_across_conventions() {
        for alias in [
            "marketCapChange5s",
            "market_cap_change_5s",
            "mc_change_5s",
            "MARKETCAPCHANGE5S",
        ] {
            assert_eq!(Metric::from_alias(alias), Some(Metric::McChange5s), "{alias}");
        }
        assert_eq!(Metric::from_alias("holdersCount"), Some(Metric::HoldersCount));
        assert_eq!(Metric::from_alias("holder_delta_30s"), Some(Metric::HolderDelta30s));
        // The historical mapping carried this short form for price change.
        assert_eq!(Metric::from_alias("pricepercent"), Some(Metric::PriceChange));
        assert_eq!(Metric::from_alias("no_such_field"), None);
    }

    #[test]
    fn canonical_names_roundtrip_through_alias_lookup() {
        let all = [
            Metric::MarketCap,
            Metric::HoldersCount,
            Metric::McChange5s,
            Metric::McChange10s,
            Metric::McChange30s,
            Metric::McChange60s,
            Metric::HolderDelta5s,
            Metric::HolderDelta10s,
            Metric::HolderDelta30s,
            Metric::HolderDelta60s,
            Metric::BuyVolume5s,
            Metric::BuyVolume10s,
            Metric::NetVolume5s,
            Metric::NetVolume10s,
            Metric::PriceChange,
            Metric::LargeBuy5s,
            Metric::BigBuy5s,
            Metric::SuperBuy5s,
            Metric::BuySellRatio10s,
            Metric::McGrowthFromStart,
            Metric::HolderGrowthFromStart,
        ];
        for metric in all {
            assert_eq!(Metric::from_alias(metric.canonical_name()), Some(metric));
        }
    }

    #[test]
    fn metric_serde_uses_canonical_string() {
        let json = serde_json::to_string(&Metric::HolderDelta30s).unwrap();
        assert_eq!(json, "\"holder_delta_30s\"");
        let back: Metric = serde_json::from_str("\"holderDelta30s\"").unwrap();
        assert_eq!(back, Metric::HolderDelta30s);
    }

    #[test]
    fn resolve_stored_and_missing_fields() {
        let mut s = snap(0, 50_000.0, 20.0);
        s.buy_volume_5s = Some(7.5);
        let series = PoolSeries::new("p", vec![s]);
        assert_eq!(resolve(&series, 0, Metric::BuyVolume5s), Some(7.5));
        assert_eq!(resolve(&series, 0, Metric::NetVolume5s), None);
        assert_eq!(resolve(&series, 1, Metric::MarketCap), None);
    }

    #[test]
    fn growth_from_start_is_relative_to_row_zero() {
        let series = PoolSeries::new(
            "p",
            vec![snap(0, 40_000.0, 10.0), snap(1, 44_000.0, 12.0), snap(2, 80_000.0, 35.0)],
        );
        let growth = resolve(&series, 2, Metric::McGrowthFromStart).unwrap();
        assert!((growth - 100.0).abs() < 1e-9);
        let holders = resolve(&series, 2, Metric::HolderGrowthFromStart).unwrap();
        assert!((holders - 25.0).abs() < 1e-9);
    }

    #[test]
    fn growth_from_start_neutral_on_zero_initial() {
        let series = PoolSeries::new("p", vec![snap(0, 0.0, 0.0), snap(1, 50_000.0, 10.0)]);
        assert_eq!(resolve(&series, 1, Metric::McGrowthFromStart), Some(0.0));
    }

    #[test]
    fn buy_sell_ratio_from_breakdown() {
        let mut s = snap(0, 50_000.0, 20.0);
        s.buy_volume_10s = Some(15.0);
        s.trade_breakdown = Some(TradeBreakdown {
            last_5s: None,
            last_10s: Some(TradeWindow {
                volume: SideVolume { buy: 15.0, sell: 5.0 },
                count: SideCount { buy: 9, sell: 3 },
                large_buys: 0,
                big_buys: 0,
                super_buys: 0,
            }),
        });
        let series = PoolSeries::new("p", vec![s.clone()]);
        assert_eq!(resolve(&series, 0, Metric::BuySellRatio10s), Some(3.0));

        // No sells at all: ratio is infinite, not an error.
        s.trade_breakdown = Some(TradeBreakdown {
            last_5s: None,
            last_10s: Some(TradeWindow {
                volume: SideVolume { buy: 15.0, sell: 0.0 },
                count: SideCount { buy: 9, sell: 0 },
                large_buys: 0,
                big_buys: 0,
                super_buys: 0,
            }),
        });
        let series = PoolSeries::new("p", vec![s]);
        assert_eq!(
            resolve(&series, 0, Metric::BuySellRatio10s),
            Some(f64::INFINITY)
        );
    }

    #[test]
    fn buy_sell_ratio_unresolvable_without_breakdown() {
        let mut s = snap(0, 50_000.0, 20.0);
        s.buy_volume_10s = Some(15.0);
        let series = PoolSeries::new("p", vec![s]);
        assert_eq!(resolve(&series, 0, Metric::BuySellRatio10s), None);
    }
}
