//! Cache port shared by every cache tier.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::CacheResult;

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of live entries.
    pub size: usize,
    /// Live keys, sorted.
    pub keys: Vec<String>,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, or 0 before the first lookup.
    pub hit_rate: f64,
}

impl CacheStats {
    #[must_use]
    pub fn new(mut keys: Vec<String>, hits: u64, misses: u64) -> Self {
        keys.sort();
        let lookups = hits + misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        };
        Self {
            size: keys.len(),
            keys,
            hits,
            misses,
            hit_rate,
        }
    }
}

/// Asynchronous key-value cache.
///
/// A `ttl` of `None` means the implementation's default TTL. A zero TTL is
/// rejected with [`CacheError::InvalidTtl`](crate::error::CacheError::InvalidTtl).
/// Expired entries are never returned.
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Store `value` under `key`, replacing any previous entry.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<()>;

    /// Fetch a live value.
    async fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    /// Return `true` if `key` holds a live value. Does not count as a lookup.
    async fn has(&self, key: &str) -> CacheResult<bool>;

    /// Remove `key`. Returns `true` if an entry was removed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Remove every entry and reset hit/miss counters. Idempotent.
    async fn clear(&self) -> CacheResult<()>;

    async fn stats(&self) -> CacheResult<CacheStats>;

    /// Store several entries with one TTL.
    async fn mset(&self, entries: Vec<(String, Value)>, ttl: Option<Duration>) -> CacheResult<()> {
        for (key, value) in entries {
            self.set(&key, value, ttl).await?;
        }
        Ok(())
    }

    /// Fetch several keys, preserving order.
    async fn mget(&self, keys: &[String]) -> CacheResult<Vec<Option<Value>>> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }

    /// Add `by` to an integer value, creating it with the default TTL when absent.
    async fn incr(&self, key: &str, by: i64) -> CacheResult<i64>;

    async fn decr(&self, key: &str, by: i64) -> CacheResult<i64> {
        self.incr(key, by.saturating_neg()).await
    }

    /// Reset the TTL of a live entry. Returns `false` if `key` is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool>;

    /// Remaining lifetime of a live entry, `None` if absent.
    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>>;
}

/// Typed helpers over [`CacheService`].
#[async_trait]
pub trait CacheServiceExt: CacheService {
    /// Fetch and deserialize a value.
    async fn get_as<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serialize and store a value.
    async fn set_as<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<()>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(value)?;
        self.set(key, value, ttl).await
    }
}

impl<C: CacheService + ?Sized> CacheServiceExt for C {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_is_zero_without_lookups() {
        let stats = CacheStats::new(vec![], 0, 0);
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(stats.size, 0);
    }

    #[test]
    fn stats_sort_keys_and_compute_rate() {
        let stats = CacheStats::new(vec!["b".into(), "a".into()], 3, 1);
        assert_eq!(stats.keys, vec!["a", "b"]);
        assert_eq!(stats.size, 2);
        assert!((stats.hit_rate - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn stats_serialize_camel_case() {
        let json = serde_json::to_value(CacheStats::new(vec![], 1, 1)).unwrap();
        assert_eq!(json["hitRate"], 0.5);
    }
}
