//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file with environment variable
//! overrides for deployment-specific values like the Redis URL.
//!
//! # Example
//!
//! ```no_run
//! use xpguard::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::cache::CacheConfig;
use super::cluster::ClusterConfig;
use super::logging::LoggingConfig;
use super::thresholds::ThresholdsConfig;
use crate::error::{ConfigError, Result};

/// Overrides `cache.redis_url`.
pub const REDIS_URL_ENV: &str = "XPGUARD_REDIS_URL";
/// Overrides `cluster.node_id`.
pub const NODE_ID_ENV: &str = "XPGUARD_NODE_ID";

/// Main application configuration.
///
/// Every table is optional; a missing table takes its defaults. Load from a
/// TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Cache backend selection and sizing.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Cross-node cache sync.
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Validator thresholds, loaded once and never mutated.
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// Applies `XPGUARD_*` environment overrides before validating.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load `path` if it exists, otherwise start from defaults.
    ///
    /// Environment overrides and validation apply either way.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file is unreadable or invalid.
    #[allow(clippy::result_large_err)]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        debug!(path = %path.display(), "Config file not found, using defaults");
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-style overrides read through `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(REDIS_URL_ENV) {
            self.cache.redis_url = Some(url);
        }
        if let Some(node_id) = non_empty(NODE_ID_ENV) {
            self.cluster.node_id = node_id;
        }
    }

    /// Validate configuration values.
    ///
    /// Checks that required fields are present and values are within
    /// acceptable ranges.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        self.cluster.validate()?;
        self.thresholds.validate()?;
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
