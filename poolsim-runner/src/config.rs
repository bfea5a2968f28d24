//! Batch configuration: strategy parameters plus execution options,
//! loadable from TOML.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use poolsim_core::config::ConfigError;
use poolsim_core::{ExitConfig, ScanConfig};

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Everything one batch run needs. Defaults reproduce the tuned
/// strategy; a config file only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub scan: ScanConfig,
    pub exit: ExitConfig,
    /// Process pools across threads. Results are identical either way.
    pub parallel: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            exit: ExitConfig::default(),
            parallel: true,
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_path(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let text = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scan.validate()?;
        self.exit.validate()?;
        Ok(())
    }

    /// Stable identifier for this parameter set. Execution options do
    /// not participate; only the strategy parameters do.
    pub fn run_id(&self) -> String {
        // Serialization here is deterministic: field order is fixed and
        // no maps are involved.
        let bytes = serde_json::to_vec(&(&self.scan, &self.exit)).unwrap_or_default();
        blake3::hash(&bytes).to_hex().to_string()
    }
}
