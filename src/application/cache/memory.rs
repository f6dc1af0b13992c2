//! Bounded in-process cache with TTL expiry and policy eviction.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::debug;

use super::eviction::EvictionPolicy;
use crate::error::{CacheError, CacheResult};
use crate::port::{CacheService, CacheStats};

/// A stored value with its bookkeeping.
///
/// Hit count and last access are atomics so lookups only need the read lock.
#[derive(Debug)]
pub(crate) struct CacheEntry {
    value: Value,
    inserted_at: Instant,
    ttl: Duration,
    sequence: u64,
    hits: AtomicU64,
    last_access: AtomicU64,
}

impl CacheEntry {
    pub(crate) fn new(
        value: Value,
        inserted_at: Instant,
        ttl: Duration,
        sequence: u64,
        tick: u64,
    ) -> Self {
        Self {
            value,
            inserted_at,
            ttl,
            sequence,
            hits: AtomicU64::new(0),
            last_access: AtomicU64::new(tick),
        }
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) > self.ttl
    }

    pub(crate) fn remaining(&self, now: Instant) -> Duration {
        self.ttl
            .saturating_sub(now.saturating_duration_since(self.inserted_at))
    }

    pub(crate) fn touch(&self, tick: u64) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.last_access.store(tick, Ordering::Relaxed);
    }

    pub(crate) fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub(crate) fn last_access(&self) -> u64 {
        self.last_access.load(Ordering::Relaxed)
    }

    pub(crate) const fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Construction options for [`MemoryCache`].
#[derive(Debug, Clone)]
pub struct MemoryCacheOptions {
    /// Entry limit. Choosing an eviction victim scans every entry.
    pub max_size: usize,
    pub default_ttl: Duration,
    pub eviction: EvictionPolicy,
}

impl Default for MemoryCacheOptions {
    fn default() -> Self {
        Self {
            max_size: 10_000,
            default_ttl: Duration::from_secs(300),
            eviction: EvictionPolicy::Lru,
        }
    }
}

/// Bounded in-memory [`CacheService`].
///
/// Expired entries are dropped lazily on lookup, when chosen as an eviction
/// victim, or by [`MemoryCache::prune_expired`].
#[derive(Debug)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    options: MemoryCacheOptions,
    /// Logical clock for LRU ordering and insertion sequence.
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(MemoryCacheOptions::default())
    }
}

impl MemoryCache {
    #[must_use]
    pub fn new(options: MemoryCacheOptions) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            options: MemoryCacheOptions {
                max_size: options.max_size.max(1),
                ..options
            },
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub const fn options(&self) -> &MemoryCacheOptions {
        &self.options
    }

    /// Number of stored entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn resolve_ttl(&self, ttl: Option<Duration>) -> CacheResult<Duration> {
        match ttl {
            Some(ttl) if ttl.is_zero() => Err(CacheError::InvalidTtl),
            Some(ttl) => Ok(ttl),
            None => Ok(self.options.default_ttl),
        }
    }

    fn insert(&self, entries: &mut HashMap<String, CacheEntry>, key: &str, value: Value, ttl: Duration) {
        let now = Instant::now();
        if !entries.contains_key(key) && entries.len() >= self.options.max_size {
            if let Some(victim) = self.options.eviction.select_victim(entries, now) {
                entries.remove(&victim);
                debug!(key = %victim, policy = %self.options.eviction, "Evicted cache entry");
            }
        }
        let tick = self.tick();
        entries.insert(key.to_string(), CacheEntry::new(value, now, ttl, tick, tick));
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        before - entries.len()
    }

    /// Periodically purge expired entries on the tokio runtime.
    ///
    /// The task holds a weak reference and stops once the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let removed = cache.prune_expired();
                if removed > 0 {
                    debug!(removed, remaining = cache.len(), "Swept expired cache entries");
                }
            }
        })
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<()> {
        let ttl = self.resolve_ttl(ttl)?;
        let mut entries = self.entries.write();
        self.insert(&mut entries, key, value, ttl);
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => {
                    entry.touch(self.tick());
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return Ok(None);
                }
            }
        }

        // Expired: upgrade to the write lock and re-check before removing.
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    async fn has(&self, key: &str) -> CacheResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .get(key)
            .is_some_and(|e| !e.is_expired(now)))
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }

    async fn clear(&self) -> CacheResult<()> {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        Ok(())
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        let now = Instant::now();
        let keys = self
            .entries
            .read()
            .iter()
            .filter(|(_, e)| !e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        Ok(CacheStats::new(
            keys,
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        ))
    }

    async fn mset(&self, items: Vec<(String, Value)>, ttl: Option<Duration>) -> CacheResult<()> {
        let ttl = self.resolve_ttl(ttl)?;
        let mut entries = self.entries.write();
        for (key, value) in items {
            self.insert(&mut entries, &key, value, ttl);
        }
        Ok(())
    }

    async fn incr(&self, key: &str, by: i64) -> CacheResult<i64> {
        let now = Instant::now();
        let mut entries = self.entries.write();

        if let Some(entry) = entries.get_mut(key).filter(|e| !e.is_expired(now)) {
            let current = entry.value.as_i64().ok_or_else(|| CacheError::NotAnInteger {
                key: key.to_string(),
            })?;
            let next = current.saturating_add(by);
            entry.value = Value::from(next);
            return Ok(next);
        }

        entries.remove(key);
        self.insert(&mut entries, key, Value::from(by), self.options.default_ttl);
        Ok(by)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        let ttl = self.resolve_ttl(Some(ttl))?;
        let now = Instant::now();
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.inserted_at = now;
                entry.ttl = ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.remaining(now)))
    }
}
