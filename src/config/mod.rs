//! Configuration module - environment variable parsing

use std::env;

use crate::game::interp::{DEFAULT_BUFFER_CAPACITY, DEFAULT_RENDER_DELAY_MS};
use crate::util::time::{DEFAULT_SIMULATION_TPS, DEFAULT_SNAPSHOT_TPS};

/// Application configuration loaded from environment variables.
/// Every variable is optional; defaults match the tuned tick rates.
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Simulation ticks per second
    pub simulation_tps: u32,
    /// Snapshot broadcasts per second (capped at the simulation rate)
    pub snapshot_tps: u32,
    /// Snapshots retained per remote entity
    pub interp_capacity: usize,
    /// Fixed render delay for remote-entity interpolation, milliseconds
    pub render_delay_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let simulation_tps = parse_var("SIMULATION_TPS", DEFAULT_SIMULATION_TPS)?;
        let snapshot_tps: u32 = parse_var("SNAPSHOT_TPS", DEFAULT_SNAPSHOT_TPS)?;

        if simulation_tps == 0 {
            return Err(ConfigError::Invalid("SIMULATION_TPS"));
        }
        if snapshot_tps == 0 || snapshot_tps > simulation_tps {
            return Err(ConfigError::Invalid("SNAPSHOT_TPS"));
        }

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            simulation_tps,
            snapshot_tps,
            interp_capacity: parse_var("INTERP_CAPACITY", DEFAULT_BUFFER_CAPACITY)?,
            render_delay_ms: parse_var("RENDER_DELAY_MS", DEFAULT_RENDER_DELAY_MS)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            simulation_tps: DEFAULT_SIMULATION_TPS,
            snapshot_tps: DEFAULT_SNAPSHOT_TPS,
            interp_capacity: DEFAULT_BUFFER_CAPACITY,
            render_delay_ms: DEFAULT_RENDER_DELAY_MS,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
