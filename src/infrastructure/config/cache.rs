//! Cache backend configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::adapter::outbound::redis::RedisCacheOptions;
use crate::application::cache::{EvictionPolicy, MemoryCacheOptions};
use crate::error::ConfigError;

/// Which cache implementation to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    /// In-process memory cache only.
    #[default]
    Memory,
    /// Redis only.
    Redis,
    /// Memory in front of Redis.
    Hybrid,
}

impl CacheKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redis => "redis",
            Self::Hybrid => "hybrid",
        }
    }

    /// Return `true` if this kind talks to Redis.
    #[must_use]
    pub const fn needs_redis(self) -> bool {
        matches!(self, Self::Redis | Self::Hybrid)
    }
}

/// The `[cache]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub kind: CacheKind,

    /// TTL applied when a caller passes none. Defaults to 5 minutes.
    #[serde(default = "default_ttl_ms")]
    pub default_ttl_ms: u64,

    /// Upper bound on memory-tier entries. Defaults to 10,000.
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    #[serde(default)]
    pub eviction: EvictionPolicy,

    /// Redis connection URL. Required for `redis` and `hybrid`.
    ///
    /// Overridden by `XPGUARD_REDIS_URL`.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Namespace for Redis keys. Defaults to "xpguard".
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Interval of the expired-entry sweeper. Zero disables it.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            kind: CacheKind::default(),
            default_ttl_ms: default_ttl_ms(),
            max_size: default_max_size(),
            eviction: EvictionPolicy::default(),
            redis_url: None,
            key_prefix: default_key_prefix(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// `None` when the sweeper is disabled.
    #[must_use]
    pub const fn sweep_interval(&self) -> Option<Duration> {
        if self.sweep_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.sweep_interval_secs))
        }
    }

    #[must_use]
    pub fn memory_options(&self) -> MemoryCacheOptions {
        MemoryCacheOptions {
            max_size: self.max_size,
            default_ttl: self.default_ttl(),
            eviction: self.eviction,
        }
    }

    #[must_use]
    pub fn redis_options(&self) -> RedisCacheOptions {
        RedisCacheOptions {
            key_prefix: self.key_prefix.clone(),
            default_ttl: self.default_ttl(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_size",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.default_ttl_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_ttl_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.kind.needs_redis() && self.redis_url.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingField { field: "redis_url" });
        }
        Ok(())
    }
}

const fn default_ttl_ms() -> u64 {
    300_000
}

const fn default_max_size() -> usize {
    10_000
}

fn default_key_prefix() -> String {
    "xpguard".to_string()
}

const fn default_sweep_interval_secs() -> u64 {
    60
}
