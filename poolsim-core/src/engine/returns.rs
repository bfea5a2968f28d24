//! Theoretical return calculation for a buy opportunity.

use tracing::debug;

use crate::config::REALISTIC_FRACTION;
use crate::domain::{BuyOpportunity, TheoreticalReturns};

impl TheoreticalReturns {
    /// Best-case outcome over the whole post-entry window: the peak
    /// valuation, the multiple it represents, and a discounted multiple
    /// assuming the exit lands at a fixed fraction of that peak. `None`
    /// when the window holds no usable valuation or the entry price is
    /// unusable.
    pub fn compute(opp: &BuyOpportunity) -> Option<Self> {
        if !(opp.entry_price.is_finite() && opp.entry_price > 0.0) {
            return None;
        }

        let mut max_price = f64::NEG_INFINITY;
        let mut bars_to_max = 0;
        let mut time_of_max = opp.entry_time;
        for (offset, snap) in opp.post_entry.iter().enumerate() {
            if !snap.has_sane_valuation() {
                continue;
            }
            if snap.market_cap > max_price {
                max_price = snap.market_cap;
                bars_to_max = offset;
                time_of_max = snap.timestamp;
            }
        }
        if !max_price.is_finite() {
            return None;
        }

        let max_return = max_price / opp.entry_price;
        let returns = Self {
            max_price,
            max_return,
            realistic_return: max_return * REALISTIC_FRACTION,
            bars_to_max,
            secs_to_max: (time_of_max - opp.entry_time).num_seconds(),
        };
        debug!(
            pool = %opp.pool_address,
            max_return,
            bars_to_max,
            "theoretical returns computed"
        );
        Some(returns)
    }
}
