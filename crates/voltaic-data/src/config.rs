//! Grid configuration: tick cadence and logging filter.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the stock half-second cadence with `info` logging.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::loader::{DataLoadError, deserialize_file};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub simulation: SimulationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Milliseconds between distribution ticks.
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing-subscriber` env-filter directive, e.g. `"voltaic_core=debug"`.
    pub filter: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { tick_interval_ms: 500 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl GridConfig {
    /// Load and validate a configuration file (RON, TOML or JSON).
    pub fn load(path: &Path) -> Result<Self, DataLoadError> {
        let config: GridConfig = deserialize_file(path)?;
        config.tick_interval()?;
        Ok(config)
    }

    pub fn tick_interval(&self) -> Result<Duration, DataLoadError> {
        match self.simulation.tick_interval_ms {
            0 => Err(DataLoadError::Invalid(
                "simulation.tick_interval_ms must be positive".to_string(),
            )),
            ms => Ok(Duration::from_millis(ms)),
        }
    }
}
