//! Cross-node cache mutation events.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of mutation carried by a [`CacheSyncEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    Set,
    Delete,
    Clear,
}

/// A cache mutation broadcast to cooperating nodes.
///
/// Delivery is fire-and-forget and unordered. Receivers drop events whose
/// `node_id` equals their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSyncEvent {
    #[serde(rename = "type")]
    pub kind: SyncKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_ms: Option<u64>,
    pub node_id: String,
    pub timestamp: DateTime<Utc>,
}

impl CacheSyncEvent {
    #[must_use]
    pub fn set(
        node_id: impl Into<String>,
        key: impl Into<String>,
        value: Value,
        ttl: Option<Duration>,
    ) -> Self {
        Self {
            kind: SyncKind::Set,
            key: Some(key.into()),
            value: Some(value),
            ttl_ms: ttl.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
            node_id: node_id.into(),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn delete(node_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kind: SyncKind::Delete,
            key: Some(key.into()),
            value: None,
            ttl_ms: None,
            node_id: node_id.into(),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn clear(node_id: impl Into<String>) -> Self {
        Self {
            kind: SyncKind::Clear,
            key: None,
            value: None,
            ttl_ms: None,
            node_id: node_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// TTL carried by a `set` event.
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_ms.map(Duration::from_millis)
    }

    /// Return `true` if this event originated on `node_id`.
    #[must_use]
    pub fn is_from(&self, node_id: &str) -> bool {
        self.node_id == node_id
    }
}
