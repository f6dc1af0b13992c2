//! Two-tier cache: memory (L1) in front of an optional remote tier (L2).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::memory::MemoryCache;
use crate::error::CacheResult;
use crate::port::{CacheService, CacheStats};

/// Key read from the remote tier at construction to check it is reachable.
const HEALTH_KEY: &str = "__xpguard_health__";

/// Memory cache backed by an optional remote tier.
///
/// L1 is authoritative for the caller. L2 writes are spawned and never
/// awaited; L2 failures on any path are logged and treated as a miss or a
/// no-op, so the hybrid cache only fails when L1 does.
pub struct HybridCache {
    l1: Arc<MemoryCache>,
    l2: Option<Arc<dyn CacheService>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl HybridCache {
    /// Build a cache that never touches a remote tier.
    #[must_use]
    pub fn memory_only(l1: Arc<MemoryCache>) -> Self {
        Self::new(l1, None)
    }

    #[must_use]
    pub fn new(l1: Arc<MemoryCache>, l2: Option<Arc<dyn CacheService>>) -> Self {
        Self {
            l1,
            l2,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Build a cache over `l2`, falling back to memory-only if it is unreachable.
    pub async fn connect(l1: Arc<MemoryCache>, l2: Arc<dyn CacheService>) -> Self {
        match l2.has(HEALTH_KEY).await {
            Ok(_) => Self::new(l1, Some(l2)),
            Err(e) => {
                warn!(error = %e, "Remote cache unreachable, running memory-only");
                Self::memory_only(l1)
            }
        }
    }

    /// Return `true` if a remote tier is attached.
    #[must_use]
    pub fn has_remote(&self) -> bool {
        self.l2.is_some()
    }

    #[must_use]
    pub fn memory(&self) -> &Arc<MemoryCache> {
        &self.l1
    }

    fn default_ttl(&self) -> Duration {
        self.l1.options().default_ttl
    }

    /// Read from L2 and populate L1 with L2's remaining TTL.
    async fn read_through(&self, l2: &Arc<dyn CacheService>, key: &str) -> Option<Value> {
        let value = match l2.get(key).await {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Remote cache read failed");
                return None;
            }
        };

        let ttl = match l2.ttl(key).await {
            Ok(Some(remaining)) if !remaining.is_zero() => remaining,
            Ok(_) => self.default_ttl(),
            Err(e) => {
                warn!(key = %key, error = %e, "Remote cache ttl lookup failed");
                self.default_ttl()
            }
        };

        if let Err(e) = self.l1.set(key, value.clone(), Some(ttl)).await {
            warn!(key = %key, error = %e, "Failed to populate memory tier");
        }
        debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "Populated memory tier from remote");
        Some(value)
    }
}

#[async_trait]
impl CacheService for HybridCache {
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<()> {
        let ttl = Some(ttl.unwrap_or_else(|| self.default_ttl()));
        self.l1.set(key, value.clone(), ttl).await?;

        if let Some(l2) = &self.l2 {
            let l2 = Arc::clone(l2);
            let key = key.to_string();
            tokio::spawn(async move {
                if let Err(e) = l2.set(&key, value, ttl).await {
                    warn!(key = %key, error = %e, "Remote cache write failed");
                }
            });
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        if let Some(value) = self.l1.get(key).await? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(value));
        }

        let value = match &self.l2 {
            Some(l2) => self.read_through(l2, key).await,
            None => None,
        };
        let counter = if value.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(value)
    }

    async fn has(&self, key: &str) -> CacheResult<bool> {
        if self.l1.has(key).await? {
            return Ok(true);
        }
        match &self.l2 {
            Some(l2) => Ok(l2.has(key).await.unwrap_or_else(|e| {
                warn!(key = %key, error = %e, "Remote cache exists check failed");
                false
            })),
            None => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let local = self.l1.delete(key).await?;
        let remote = match &self.l2 {
            Some(l2) => l2.delete(key).await.unwrap_or_else(|e| {
                warn!(key = %key, error = %e, "Remote cache delete failed");
                false
            }),
            None => false,
        };
        Ok(local || remote)
    }

    async fn clear(&self) -> CacheResult<()> {
        self.l1.clear().await?;
        if let Some(l2) = &self.l2 {
            if let Err(e) = l2.clear().await {
                warn!(error = %e, "Remote cache clear failed");
            }
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        Ok(())
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        let local = self.l1.stats().await?;
        Ok(CacheStats::new(
            local.keys,
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        ))
    }

    async fn incr(&self, key: &str, by: i64) -> CacheResult<i64> {
        let Some(l2) = &self.l2 else {
            return self.l1.incr(key, by).await;
        };

        // The remote counter is shared across nodes, so it wins when reachable.
        match l2.incr(key, by).await {
            Ok(value) => {
                let ttl = l2.ttl(key).await.ok().flatten().filter(|t| !t.is_zero());
                self.l1.set(key, Value::from(value), ttl).await?;
                Ok(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Remote cache incr failed, using memory tier");
                self.l1.incr(key, by).await
            }
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        let local = self.l1.expire(key, ttl).await?;
        let remote = match &self.l2 {
            Some(l2) => l2.expire(key, ttl).await.unwrap_or_else(|e| {
                warn!(key = %key, error = %e, "Remote cache expire failed");
                false
            }),
            None => false,
        };
        Ok(local || remote)
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        if let Some(remaining) = self.l1.ttl(key).await? {
            return Ok(Some(remaining));
        }
        match &self.l2 {
            Some(l2) => Ok(l2.ttl(key).await.unwrap_or_else(|e| {
                warn!(key = %key, error = %e, "Remote cache ttl lookup failed");
                None
            })),
            None => Ok(None),
        }
    }
}
