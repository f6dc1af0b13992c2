//! Cross-node cache synchronization over a [`MessageBus`].
//!
//! Sync is eventual and unordered. Events are applied with plain cache
//! operations, so duplicates and reordering are harmless: `set` overwrites,
//! `delete` of an absent key is a no-op, `clear` is idempotent.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{CacheSyncEvent, SyncKind};
use crate::error::CacheResult;
use crate::port::{CacheService, CacheStats, MessageBus};

/// Publishes local cache mutations and applies remote ones.
pub struct SyncManager {
    node_id: String,
    bus: Arc<dyn MessageBus>,
    cache: Arc<dyn CacheService>,
    resubscribe_delay: Duration,
}

impl SyncManager {
    /// `cache` receives remote mutations; it must be the unsynced inner
    /// cache, or applied events would be re-published.
    #[must_use]
    pub fn new(
        node_id: impl Into<String>,
        bus: Arc<dyn MessageBus>,
        cache: Arc<dyn CacheService>,
        resubscribe_delay: Duration,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            bus,
            cache,
            resubscribe_delay,
        }
    }

    async fn publish(&self, event: CacheSyncEvent) {
        if let Err(e) = self.bus.publish(&event).await {
            warn!(node_id = %self.node_id, kind = ?event.kind, error = %e, "Failed to publish sync event");
        }
    }

    pub async fn publish_set(&self, key: &str, value: Value, ttl: Option<Duration>) {
        self.publish(CacheSyncEvent::set(&self.node_id, key, value, ttl))
            .await;
    }

    pub async fn publish_delete(&self, key: &str) {
        self.publish(CacheSyncEvent::delete(&self.node_id, key)).await;
    }

    pub async fn publish_clear(&self) {
        self.publish(CacheSyncEvent::clear(&self.node_id)).await;
    }

    /// Apply a remote event to the local cache.
    ///
    /// Returns `false` for events that originated on this node or are
    /// missing required fields. Cache errors are logged.
    pub async fn apply(&self, event: &CacheSyncEvent) -> bool {
        if event.is_from(&self.node_id) {
            return false;
        }

        let result = match (event.kind, event.key.as_deref()) {
            (SyncKind::Set, Some(key)) => match &event.value {
                Some(value) => self.cache.set(key, value.clone(), event.ttl()).await,
                None => {
                    warn!(key = %key, origin = %event.node_id, "Set event without value");
                    return false;
                }
            },
            (SyncKind::Delete, Some(key)) => self.cache.delete(key).await.map(|_| ()),
            (SyncKind::Clear, _) => self.cache.clear().await,
            (kind, None) => {
                warn!(kind = ?kind, origin = %event.node_id, "Sync event without key");
                return false;
            }
        };

        match result {
            Ok(()) => {
                debug!(kind = ?event.kind, key = ?event.key, origin = %event.node_id, "Applied sync event");
                true
            }
            Err(e) => {
                warn!(kind = ?event.kind, origin = %event.node_id, error = %e, "Failed to apply sync event");
                false
            }
        }
    }

    /// Listen for remote events until the task is aborted.
    ///
    /// When the subscription fails or ends, the listener waits
    /// `resubscribe_delay` and subscribes again.
    pub fn spawn_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match manager.bus.subscribe().await {
                    Ok(mut events) => {
                        info!(node_id = %manager.node_id, "Cache sync listener subscribed");
                        while let Some(event) = events.recv().await {
                            manager.apply(&event).await;
                        }
                        warn!(node_id = %manager.node_id, "Cache sync subscription ended");
                    }
                    Err(e) => {
                        warn!(node_id = %manager.node_id, error = %e, "Cache sync subscribe failed");
                    }
                }
                tokio::time::sleep(manager.resubscribe_delay).await;
            }
        })
    }
}

/// A [`CacheService`] that publishes every successful mutation.
///
/// `expire` stays local: sync events carry only `set`, `delete` and `clear`.
pub struct SyncedCache {
    inner: Arc<dyn CacheService>,
    sync: Arc<SyncManager>,
}

impl SyncedCache {
    #[must_use]
    pub fn new(inner: Arc<dyn CacheService>, sync: Arc<SyncManager>) -> Self {
        Self { inner, sync }
    }
}

#[async_trait]
impl CacheService for SyncedCache {
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<()> {
        self.inner.set(key, value.clone(), ttl).await?;
        self.sync.publish_set(key, value, ttl).await;
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        self.inner.get(key).await
    }

    async fn has(&self, key: &str) -> CacheResult<bool> {
        self.inner.has(key).await
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let removed = self.inner.delete(key).await?;
        // Peers may hold the key even when this node does not.
        self.sync.publish_delete(key).await;
        Ok(removed)
    }

    async fn clear(&self) -> CacheResult<()> {
        self.inner.clear().await?;
        self.sync.publish_clear().await;
        Ok(())
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        self.inner.stats().await
    }

    async fn mset(&self, entries: Vec<(String, Value)>, ttl: Option<Duration>) -> CacheResult<()> {
        self.inner.mset(entries.clone(), ttl).await?;
        for (key, value) in entries {
            self.sync.publish_set(&key, value, ttl).await;
        }
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> CacheResult<Vec<Option<Value>>> {
        self.inner.mget(keys).await
    }

    async fn incr(&self, key: &str, by: i64) -> CacheResult<i64> {
        let value = self.inner.incr(key, by).await?;
        let ttl = self.inner.ttl(key).await.ok().flatten();
        self.sync.publish_set(key, Value::from(value), ttl).await;
        Ok(value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        self.inner.expire(key, ttl).await
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        self.inner.ttl(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::local::LocalBus;
    use crate::application::cache::MemoryCache;
    use crate::testkit::bus::RecordingBus;
    use serde_json::json;

    fn manager(node: &str, bus: Arc<dyn MessageBus>) -> (Arc<SyncManager>, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::default());
        let manager = Arc::new(SyncManager::new(
            node,
            bus,
            cache.clone(),
            Duration::from_millis(10),
        ));
        (manager, cache)
    }

    #[tokio::test]
    async fn own_events_are_ignored() {
        let (manager, cache) = manager("node-a", Arc::new(LocalBus::default()));
        let event = CacheSyncEvent::set("node-a", "k", json!(1), None);
        assert!(!manager.apply(&event).await);
        assert!(!cache.has("k").await.unwrap());
    }

    #[tokio::test]
    async fn remote_events_are_applied_idempotently() {
        let (manager, cache) = manager("node-b", Arc::new(LocalBus::default()));

        let set = CacheSyncEvent::set("node-a", "k", json!({"v": 1}), Some(Duration::from_secs(5)));
        assert!(manager.apply(&set).await);
        assert!(manager.apply(&set).await);
        assert_eq!(cache.get("k").await.unwrap(), Some(json!({"v": 1})));
        assert!(cache.ttl("k").await.unwrap().unwrap() <= Duration::from_secs(5));

        let delete = CacheSyncEvent::delete("node-a", "k");
        assert!(manager.apply(&delete).await);
        assert!(manager.apply(&delete).await);
        assert!(!cache.has("k").await.unwrap());

        cache.set("other", json!(2), None).await.unwrap();
        assert!(manager.apply(&CacheSyncEvent::clear("node-a")).await);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn incomplete_events_are_rejected() {
        let (manager, _) = manager("node-b", Arc::new(LocalBus::default()));
        let mut event = CacheSyncEvent::set("node-a", "k", json!(1), None);
        event.value = None;
        assert!(!manager.apply(&event).await);

        let mut event = CacheSyncEvent::delete("node-a", "k");
        event.key = None;
        assert!(!manager.apply(&event).await);
    }

    #[tokio::test]
    async fn synced_cache_publishes_mutations() {
        let bus = Arc::new(RecordingBus::default());
        let (manager, inner) = manager("node-a", bus.clone());
        let cache = SyncedCache::new(inner, manager);

        cache.set("k", json!(1), None).await.unwrap();
        cache.get("k").await.unwrap();
        cache.incr("n", 2).await.unwrap();
        cache.delete("k").await.unwrap();
        cache.clear().await.unwrap();

        let kinds: Vec<SyncKind> = bus.events().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![SyncKind::Set, SyncKind::Set, SyncKind::Delete, SyncKind::Clear]
        );
        assert!(bus.events().iter().all(|e| e.node_id == "node-a"));
        assert_eq!(bus.events()[1].value, Some(json!(2)));
    }

    #[tokio::test]
    async fn listener_propagates_between_nodes() {
        let bus = LocalBus::default();
        let (node_a, cache_a) = manager("node-a", Arc::new(bus.clone()));
        let (node_b, cache_b) = manager("node-b", Arc::new(bus.clone()));
        let listener_a = node_a.spawn_listener();
        let listener_b = node_b.spawn_listener();

        // Wait for both subscriptions.
        while bus.subscriber_count() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let synced_a = SyncedCache::new(cache_a.clone(), node_a.clone());
        synced_a.set("shared", json!("x"), None).await.unwrap();

        let mut propagated = false;
        for _ in 0..50 {
            if cache_b.has("shared").await.unwrap() {
                propagated = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(propagated);

        listener_a.abort();
        listener_b.abort();
    }
}
