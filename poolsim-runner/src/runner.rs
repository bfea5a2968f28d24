//! Batch orchestration: run the scan/exit pipeline over many pools.

use rayon::prelude::*;
use tracing::{info, warn};

use poolsim_core::config::ConfigError;
use poolsim_core::{
    preprocess, BuyOpportunity, EngineError, EntryScanner, ExitStateMachine, PoolSeries,
    TheoreticalReturns, TradeResult,
};

use crate::config::SimulationConfig;
use crate::metrics::TradeMetrics;
use crate::result::{BatchResult, PoolFailure};

/// What one pool contributed to the batch.
enum PoolOutcome {
    /// Below the minimum scannable length.
    Skipped,
    /// Scanned, no entry found.
    NoEntry,
    /// Entry found; the trade is absent when the post-entry window was
    /// too short to simulate.
    Entered(Box<BuyOpportunity>, Option<TradeResult>),
}

/// Runs the full pipeline over a batch of pools.
///
/// Each pool is processed independently: prepared, scanned, and (when an
/// entry is found) simulated through to an exit. A failing pool is
/// recorded and the batch continues. Parallel and sequential execution
/// produce identical results.
pub struct BacktestRunner {
    config: SimulationConfig,
    scanner: EntryScanner,
    exit: ExitStateMachine,
}

impl BacktestRunner {
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        let scanner = EntryScanner::new(config.scan.clone())?;
        let exit = ExitStateMachine::new(config.exit.clone())?;
        Ok(Self {
            config,
            scanner,
            exit,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run scan and exit simulation over every pool.
    pub fn run(&self, pools: &[PoolSeries]) -> BatchResult {
        self.run_with(pools, true)
    }

    /// Scan every pool without simulating exits. Opportunities still
    /// carry theoretical returns.
    pub fn scan_only(&self, pools: &[PoolSeries]) -> BatchResult {
        self.run_with(pools, false)
    }

    fn run_with(&self, pools: &[PoolSeries], simulate: bool) -> BatchResult {
        info!(
            pools = pools.len(),
            parallel = self.config.parallel,
            run_id = %self.config.run_id(),
            "starting batch run"
        );

        let outcomes: Vec<(String, Result<PoolOutcome, EngineError>)> = if self.config.parallel {
            pools
                .par_iter()
                .map(|p| (p.pool_address.clone(), self.process_pool(p, simulate)))
                .collect()
        } else {
            pools
                .iter()
                .map(|p| (p.pool_address.clone(), self.process_pool(p, simulate)))
                .collect()
        };

        let mut result = BatchResult {
            run_id: self.config.run_id(),
            ..BatchResult::default()
        };
        for (pool, outcome) in outcomes {
            match outcome {
                Ok(PoolOutcome::Skipped) => result.skipped_pools += 1,
                Ok(PoolOutcome::NoEntry) => result.scanned_pools += 1,
                Ok(PoolOutcome::Entered(opp, trade)) => {
                    result.scanned_pools += 1;
                    result.opportunities.push(*opp);
                    if let Some(trade) = trade {
                        result.trades.push(trade);
                    }
                }
                Err(err) => {
                    warn!(%pool, error = %err, "pool failed, continuing batch");
                    result.failures.push(PoolFailure {
                        pool_address: pool,
                        error: err.to_string(),
                    });
                }
            }
        }
        result.metrics = TradeMetrics::compute(&result.trades);

        info!(
            scanned = result.scanned_pools,
            skipped = result.skipped_pools,
            failed = result.failures.len(),
            opportunities = result.opportunities.len(),
            trades = result.trades.len(),
            "batch run finished"
        );
        result
    }

    fn process_pool(
        &self,
        series: &PoolSeries,
        simulate: bool,
    ) -> Result<PoolOutcome, EngineError> {
        if series.is_empty() {
            return Err(EngineError::EmptySeries {
                pool: series.pool_address.clone(),
            });
        }

        let mut series = series.clone();
        preprocess::prepare(&mut series);
        preprocess::derive_standard_metrics(&mut series);

        if series.len() < self.scanner.config().min_required_len() {
            return Ok(PoolOutcome::Skipped);
        }

        let Some(opp) = self.scanner.scan(&series) else {
            return Ok(PoolOutcome::NoEntry);
        };
        let opp = match TheoreticalReturns::compute(&opp) {
            Some(returns) => opp.with_returns(returns),
            None => opp,
        };
        let trade = if simulate {
            self.exit.simulate(&opp)
        } else {
            None
        };
        Ok(PoolOutcome::Entered(Box::new(opp), trade))
    }
}
