//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// Location of the persistent store
    pub database_path: PathBuf,
    /// Chance in `[0, 1]` that opening the persistent store sweeps expired entries
    pub clean_probability: f64,
    /// Periodic sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CACHE_DATABASE` - Persistent store path (default: cache.sqlite3)
    /// - `CLEAN_PROBABILITY` - Sweep-on-open probability, clamped to [0, 1] (default: 0.01)
    /// - `CLEANUP_INTERVAL` - Periodic sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            default_ttl: env::var("DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl),
            database_path: env::var("CACHE_DATABASE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            clean_probability: env::var("CLEAN_PROBABILITY")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|p| !p.is_nan())
                .map(|p| p.clamp(0.0, 1.0))
                .unwrap_or(defaults.clean_probability),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval),
        }
    }

    // == Maintenance Decision ==
    /// Turns a uniform roll in `[0, 1)` into the sweep-on-open decision.
    ///
    /// The roll is supplied by the caller so that opening a store stays
    /// deterministic.
    pub fn should_clean_on_open(&self, roll: f64) -> bool {
        roll < self.clean_probability
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: 300,
            database_path: PathBuf::from("cache.sqlite3"),
            clean_probability: 0.01,
            cleanup_interval: 60,
        }
    }
}
