//! Cross-node cache sync configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// The `[cluster]` table.
///
/// When enabled, every cache mutation is published to `channel` and
/// mutations from other nodes are applied locally.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    /// Defaults to false.
    #[serde(default)]
    pub enabled: bool,

    /// Identity of this node in sync events.
    ///
    /// Defaults to a random UUID. Overridden by `XPGUARD_NODE_ID`.
    #[serde(default = "default_node_id")]
    pub node_id: String,

    /// Delay before resubscribing after the sync subscription ends.
    /// Defaults to 5000ms.
    #[serde(default = "default_sync_interval_ms")]
    pub sync_interval_ms: u64,

    /// Pub/sub channel carrying sync events.
    #[serde(default = "default_channel")]
    pub channel: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            node_id: default_node_id(),
            sync_interval_ms: default_sync_interval_ms(),
            channel: default_channel(),
        }
    }
}

impl ClusterConfig {
    #[must_use]
    pub const fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.node_id.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "node_id" });
        }
        if self.sync_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sync_interval_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.channel.is_empty() {
            return Err(ConfigError::MissingField { field: "channel" });
        }
        Ok(())
    }
}

fn default_node_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

const fn default_sync_interval_ms() -> u64 {
    5_000
}

fn default_channel() -> String {
    "xpguard:cache-sync".to_string()
}
