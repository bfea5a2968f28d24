//! Core simulation engine for liquidity-pool market snapshots.
//!
//! The pipeline per pool: [`preprocess::prepare`] orders the raw series
//! and fills derivable change columns, [`engine::EntryScanner`] picks at
//! most one entry index, and [`engine::ExitStateMachine`] walks the
//! post-entry window to a single classified exit. Everything here is
//! pure and synchronous; batching and aggregation live in the runner
//! crate.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod fields;
pub mod preprocess;

pub use config::{BuyThresholds, ExitConfig, MomentumThresholds, ScanConfig, StopLossOverride};
pub use domain::{
    BuyOpportunity, ExitQuality, ExitReason, MarketSnapshot, PoolSeries, TheoreticalReturns,
    TradeResult,
};
pub use engine::{EntryScanner, ExitStateMachine};
pub use error::EngineError;
pub use fields::Metric;
