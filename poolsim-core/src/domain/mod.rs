//! Domain types for the pool backtesting engine.

pub mod opportunity;
pub mod series;
pub mod snapshot;
pub mod trade;

pub use opportunity::{BuyOpportunity, TheoreticalReturns};
pub use series::PoolSeries;
pub use snapshot::{MarketSnapshot, SideCount, SideVolume, TradeBreakdown, TradeWindow};
pub use trade::{ExitQuality, ExitReason, TradeResult};

/// Pool identifier type alias.
pub type PoolAddress = String;
