//! A message bus that records what it is asked to publish.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::domain::CacheSyncEvent;
use crate::error::CacheResult;
use crate::port::MessageBus;

/// Keeps every published event in memory.
///
/// Subscriptions stay open but never deliver anything, so a listener
/// spawned over this bus idles instead of resubscribing in a loop.
#[derive(Debug, Default)]
pub struct RecordingBus {
    events: Mutex<Vec<CacheSyncEvent>>,
    subscribers: Mutex<Vec<mpsc::Sender<CacheSyncEvent>>>,
}

impl RecordingBus {
    /// Snapshot of the events published so far, in order.
    pub fn events(&self) -> Vec<CacheSyncEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl MessageBus for RecordingBus {
    async fn publish(&self, event: &CacheSyncEvent) -> CacheResult<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }

    async fn subscribe(&self) -> CacheResult<mpsc::Receiver<CacheSyncEvent>> {
        let (tx, rx) = mpsc::channel(1);
        self.subscribers.lock().push(tx);
        Ok(rx)
    }
}
