//! Batch runner over the core simulation engine: configuration loading,
//! parallel execution across pools, and aggregate trade metrics.

pub mod config;
pub mod metrics;
pub mod result;
pub mod runner;

pub use config::{ConfigLoadError, SimulationConfig};
pub use metrics::TradeMetrics;
pub use result::{BatchResult, PoolFailure};
pub use runner::BacktestRunner;
