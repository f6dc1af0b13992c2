//! Cache factory.
//!
//! Remote failures during construction never abort startup: an unreachable
//! Redis degrades to the memory tier and an unreachable broker to the
//! in-process bus, each with a single warning.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::adapter::outbound::local::LocalBus;
use crate::adapter::outbound::redis::{RedisBus, RedisCache};
use crate::application::cache::{HybridCache, MemoryCache, SyncManager, SyncedCache};
use crate::infrastructure::config::cache::CacheKind;
use crate::infrastructure::config::settings::Config;
use crate::port::{CacheService, MessageBus};

/// A built cache and the background tasks that serve it.
///
/// Dropping the runtime stops the sweeper and the sync listener.
pub struct CacheRuntime {
    cache: Arc<dyn CacheService>,
    backend: String,
    tasks: Vec<JoinHandle<()>>,
}

impl CacheRuntime {
    #[must_use]
    pub fn cache(&self) -> Arc<dyn CacheService> {
        Arc::clone(&self.cache)
    }

    /// Human-readable description of what was actually built.
    #[must_use]
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Number of background tasks still attached.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl Drop for CacheRuntime {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Build the cache described by `config`.
///
/// With `cluster.enabled`, the cache is wrapped in a [`SyncedCache`] and a
/// sync listener is spawned. Must be called inside a tokio runtime.
pub async fn build_cache(config: &Config) -> CacheRuntime {
    let settings = &config.cache;
    let memory = Arc::new(MemoryCache::new(settings.memory_options()));
    let mut tasks = Vec::new();
    if let Some(interval) = settings.sweep_interval() {
        tasks.push(memory.spawn_sweeper(interval));
    }

    let redis_url = settings.redis_url.as_deref().unwrap_or_default();
    let (base, mut backend): (Arc<dyn CacheService>, String) = match settings.kind {
        CacheKind::Memory => (memory as Arc<dyn CacheService>, "memory".to_string()),
        CacheKind::Redis => match RedisCache::connect(redis_url, settings.redis_options()).await {
            Ok(redis) => (Arc::new(redis) as Arc<dyn CacheService>, "redis".to_string()),
            Err(e) => {
                warn!(error = %e, "Redis unreachable, falling back to memory cache");
                (memory as Arc<dyn CacheService>, "memory (redis unreachable)".to_string())
            }
        },
        CacheKind::Hybrid => {
            let hybrid = match RedisCache::connect(redis_url, settings.redis_options()).await {
                Ok(redis) => HybridCache::connect(memory, Arc::new(redis)).await,
                Err(e) => {
                    warn!(error = %e, "Redis unreachable, running memory-only");
                    HybridCache::memory_only(memory)
                }
            };
            let label = if hybrid.has_remote() {
                "hybrid"
            } else {
                "hybrid (memory only)"
            };
            (Arc::new(hybrid) as Arc<dyn CacheService>, label.to_string())
        }
    };

    let cache = if config.cluster.enabled {
        let bus = build_bus(config).await;
        let manager = Arc::new(SyncManager::new(
            config.cluster.node_id.clone(),
            bus,
            Arc::clone(&base),
            config.cluster.sync_interval(),
        ));
        tasks.push(manager.spawn_listener());
        backend.push_str(" + sync");
        Arc::new(SyncedCache::new(base, manager)) as Arc<dyn CacheService>
    } else {
        base
    };

    info!(
        backend = %backend,
        max_size = settings.max_size,
        eviction = %settings.eviction,
        "Cache ready"
    );
    CacheRuntime {
        cache,
        backend,
        tasks,
    }
}

async fn build_bus(config: &Config) -> Arc<dyn MessageBus> {
    let cluster = &config.cluster;
    match config.cache.redis_url.as_deref() {
        Some(url) if config.cache.kind.needs_redis() => {
            match RedisBus::connect(url, cluster.channel.clone()).await {
                Ok(bus) => return Arc::new(bus),
                Err(e) => warn!(error = %e, "Sync broker unreachable, using in-process bus"),
            }
        }
        _ => warn!("No sync broker configured, events stay inside this process"),
    }
    Arc::new(LocalBus::default())
}
