//! Redis pub/sub transport for cache sync events.

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::Client;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::CacheSyncEvent;
use crate::error::CacheResult;
use crate::port::MessageBus;

const SUBSCRIPTION_BUFFER: usize = 256;

/// [`MessageBus`] over Redis `PUBLISH`/`SUBSCRIBE` on a single channel.
///
/// Publishing shares one multiplexed connection; each subscription opens a
/// dedicated connection, as Redis requires.
pub struct RedisBus {
    client: Client,
    publisher: MultiplexedConnection,
    channel: String,
}

impl RedisBus {
    /// Connect to `url` for publishing on `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Redis`](crate::error::CacheError::Redis) if the
    /// server is unreachable.
    pub async fn connect(url: &str, channel: impl Into<String>) -> CacheResult<Self> {
        let client = Client::open(url)?;
        let publisher = client.get_multiplexed_tokio_connection().await?;
        let channel = channel.into();
        info!(channel = %channel, "Connected to Redis sync bus");
        Ok(Self {
            client,
            publisher,
            channel,
        })
    }
}

#[async_trait]
impl MessageBus for RedisBus {
    async fn publish(&self, event: &CacheSyncEvent) -> CacheResult<()> {
        let payload = serde_json::to_string(event)?;
        let mut conn = self.publisher.clone();
        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(&self.channel)
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        debug!(channel = %self.channel, kind = ?event.kind, receivers, "Published sync event");
        Ok(())
    }

    async fn subscribe(&self) -> CacheResult<mpsc::Receiver<CacheSyncEvent>> {
        let mut pubsub = self.client.get_async_connection().await?.into_pubsub();
        pubsub.subscribe(&self.channel).await?;

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let channel = self.channel.clone();
        tokio::spawn(async move {
            let mut messages = pubsub.on_message();
            loop {
                let message = tokio::select! {
                    () = tx.closed() => break,
                    message = messages.next() => match message {
                        Some(message) => message,
                        None => break,
                    },
                };
                let payload: String = match message.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(channel = %channel, error = %e, "Unreadable sync payload");
                        continue;
                    }
                };
                let event: CacheSyncEvent = match serde_json::from_str(&payload) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!(channel = %channel, error = %e, "Malformed sync event");
                        continue;
                    }
                };
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            debug!(channel = %channel, "Redis subscription ended");
        });

        Ok(rx)
    }
}
