//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use std::time::Duration;

use crate::application::cache::{EvictionPolicy, MemoryCacheOptions};
use crate::infrastructure::config::cache::{CacheConfig, CacheKind};
use crate::infrastructure::config::settings::Config;

/// Memory cache options with a small bound and the given policy.
pub fn memory_options(max_size: usize, eviction: EvictionPolicy) -> MemoryCacheOptions {
    MemoryCacheOptions {
        max_size,
        default_ttl: Duration::from_secs(60),
        eviction,
    }
}

/// A memory-only config with the sweeper disabled.
pub fn memory_config() -> Config {
    Config {
        cache: CacheConfig {
            kind: CacheKind::Memory,
            sweep_interval_secs: 0,
            ..CacheConfig::default()
        },
        ..Config::default()
    }
}

/// A hybrid config pointing at a port nothing listens on.
///
/// Building a cache from it exercises the degrade-to-memory path.
pub fn unreachable_hybrid_config() -> Config {
    Config {
        cache: CacheConfig {
            kind: CacheKind::Hybrid,
            redis_url: Some("redis://127.0.0.1:1/".to_string()),
            sweep_interval_secs: 0,
            ..CacheConfig::default()
        },
        ..Config::default()
    }
}
