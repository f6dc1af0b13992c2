//! Message bus port for cache sync events.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::CacheSyncEvent;
use crate::error::CacheResult;

/// Publish/subscribe transport for [`CacheSyncEvent`]s.
///
/// Delivery is best-effort. A subscriber sees every event published after it
/// subscribed, including its own; filtering by origin is the caller's job.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Broadcast an event to every subscriber.
    async fn publish(&self, event: &CacheSyncEvent) -> CacheResult<()>;

    /// Open a subscription. The receiver closes when the underlying
    /// subscription ends.
    async fn subscribe(&self) -> CacheResult<mpsc::Receiver<CacheSyncEvent>>;
}
