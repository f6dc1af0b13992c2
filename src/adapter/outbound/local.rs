//! In-process message bus.

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::domain::CacheSyncEvent;
use crate::error::CacheResult;
use crate::port::MessageBus;

/// [`MessageBus`] backed by a `tokio::sync::broadcast` channel.
///
/// Clones share the same channel, so several nodes in one process (or one
/// test) can exchange events. Nothing crosses the process boundary.
#[derive(Debug, Clone)]
pub struct LocalBus {
    tx: broadcast::Sender<CacheSyncEvent>,
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl LocalBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl MessageBus for LocalBus {
    async fn publish(&self, event: &CacheSyncEvent) -> CacheResult<()> {
        // No subscribers is not an error.
        let _ = self.tx.send(event.clone());
        Ok(())
    }

    async fn subscribe(&self) -> CacheResult<mpsc::Receiver<CacheSyncEvent>> {
        let mut events = self.tx.subscribe();
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    () = tx.closed() => break,
                    received = events.recv() => received,
                };
                match received {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Local sync subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("Local subscription ended");
        });
        Ok(rx)
    }
}
