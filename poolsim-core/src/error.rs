//! Engine-level errors.

use thiserror::Error;

/// Failures that make a pool unsimulatable. Threshold misses and
/// too-short windows are not errors; those surface as `None` from the
/// scanner and the exit machine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("pool {pool} has no snapshots")]
    EmptySeries { pool: String },
}
