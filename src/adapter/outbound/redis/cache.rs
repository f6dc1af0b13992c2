//! Redis-backed cache tier.
//!
//! Values are stored as JSON strings under `{key_prefix}:{key}`. Every
//! operation is a network round trip and may fail with [`CacheError::Redis`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, ErrorKind, RedisError};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{CacheError, CacheResult};
use crate::port::{CacheService, CacheStats};

const SCAN_BATCH: usize = 200;

/// Construction options for [`RedisCache`].
#[derive(Debug, Clone)]
pub struct RedisCacheOptions {
    /// Namespace prepended to every key. Empty means no namespace.
    pub key_prefix: String,
    pub default_ttl: Duration,
}

impl Default for RedisCacheOptions {
    fn default() -> Self {
        Self {
            key_prefix: "xpguard".to_string(),
            default_ttl: Duration::from_secs(300),
        }
    }
}

/// [`CacheService`] over a multiplexed Redis connection.
pub struct RedisCache {
    conn: MultiplexedConnection,
    options: RedisCacheOptions,
    hits: AtomicU64,
    misses: AtomicU64,
}

fn millis(ttl: Duration) -> CacheResult<u64> {
    if ttl.is_zero() {
        return Err(CacheError::InvalidTtl);
    }
    Ok(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1))
}

fn decode(raw: Option<String>) -> CacheResult<Option<Value>> {
    raw.map(|s| serde_json::from_str(&s)).transpose().map_err(Into::into)
}

fn map_incr_error(key: &str, e: RedisError) -> CacheError {
    if e.kind() == ErrorKind::ResponseError && e.to_string().contains("not an integer") {
        CacheError::NotAnInteger {
            key: key.to_string(),
        }
    } else {
        CacheError::Redis(e)
    }
}

impl RedisCache {
    /// Connect to `url` and verify the server answers `PING`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Redis`] if the URL is invalid or the server is
    /// unreachable.
    pub async fn connect(url: &str, options: RedisCacheOptions) -> CacheResult<Self> {
        let client = Client::open(url)?;
        let mut conn = client.get_multiplexed_tokio_connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        info!(prefix = %options.key_prefix, "Connected to Redis cache");
        Ok(Self {
            conn,
            options,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    #[must_use]
    pub const fn options(&self) -> &RedisCacheOptions {
        &self.options
    }

    fn namespaced(&self, key: &str) -> String {
        if self.options.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.options.key_prefix, key)
        }
    }

    fn strip_namespace<'a>(&self, key: &'a str) -> &'a str {
        if self.options.key_prefix.is_empty() {
            return key;
        }
        key.strip_prefix(self.options.key_prefix.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
            .unwrap_or(key)
    }

    fn resolve_ttl(&self, ttl: Option<Duration>) -> CacheResult<u64> {
        millis(ttl.unwrap_or(self.options.default_ttl))
    }

    /// All namespaced keys, collected with `SCAN` so the server is never blocked.
    async fn scan_keys(&self) -> CacheResult<Vec<String>> {
        let pattern = self.namespaced("*");
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(keys)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<()> {
        let ttl_ms = self.resolve_ttl(ttl)?;
        let payload = serde_json::to_string(&value)?;
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(self.namespaced(key))
            .arg(payload)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(self.namespaced(key))
            .query_async(&mut conn)
            .await?;
        let counter = if raw.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        decode(raw)
    }

    async fn has(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn.clone();
        let exists: i64 = redis::cmd("EXISTS")
            .arg(self.namespaced(key))
            .query_async(&mut conn)
            .await?;
        Ok(exists > 0)
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = redis::cmd("DEL")
            .arg(self.namespaced(key))
            .query_async(&mut conn)
            .await?;
        Ok(removed > 0)
    }

    async fn clear(&self) -> CacheResult<()> {
        let keys = self.scan_keys().await?;
        if !keys.is_empty() {
            let mut conn = self.conn.clone();
            for chunk in keys.chunks(SCAN_BATCH) {
                redis::cmd("DEL")
                    .arg(chunk)
                    .query_async::<_, i64>(&mut conn)
                    .await?;
            }
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!(removed = keys.len(), "Cleared Redis cache namespace");
        Ok(())
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        let keys = self
            .scan_keys()
            .await?
            .iter()
            .map(|k| self.strip_namespace(k).to_string())
            .collect();
        Ok(CacheStats::new(
            keys,
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        ))
    }

    async fn mset(&self, entries: Vec<(String, Value)>, ttl: Option<Duration>) -> CacheResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let ttl_ms = self.resolve_ttl(ttl)?;
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in &entries {
            pipe.cmd("SET")
                .arg(self.namespaced(key))
                .arg(serde_json::to_string(value)?)
                .arg("PX")
                .arg(ttl_ms)
                .ignore();
        }
        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> CacheResult<Vec<Option<Value>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let namespaced: Vec<String> = keys.iter().map(|k| self.namespaced(k)).collect();
        let mut conn = self.conn.clone();
        let raw: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&namespaced)
            .query_async(&mut conn)
            .await?;

        let found = raw.iter().filter(|r| r.is_some()).count() as u64;
        self.hits.fetch_add(found, Ordering::Relaxed);
        self.misses
            .fetch_add(raw.len() as u64 - found, Ordering::Relaxed);

        raw.into_iter().map(decode).collect()
    }

    async fn incr(&self, key: &str, by: i64) -> CacheResult<i64> {
        let namespaced = self.namespaced(key);
        let mut conn = self.conn.clone();
        let value: i64 = redis::cmd("INCRBY")
            .arg(&namespaced)
            .arg(by)
            .query_async(&mut conn)
            .await
            .map_err(|e| map_incr_error(key, e))?;

        // A fresh counter has no expiry; give it the default TTL.
        let pttl: i64 = redis::cmd("PTTL")
            .arg(&namespaced)
            .query_async(&mut conn)
            .await?;
        if pttl == -1 {
            redis::cmd("PEXPIRE")
                .arg(&namespaced)
                .arg(millis(self.options.default_ttl)?)
                .query_async::<_, i64>(&mut conn)
                .await?;
        }
        Ok(value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        let ttl_ms = millis(ttl)?;
        let mut conn = self.conn.clone();
        let applied: i64 = redis::cmd("PEXPIRE")
            .arg(self.namespaced(key))
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;
        Ok(applied == 1)
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let mut conn = self.conn.clone();
        let pttl: i64 = redis::cmd("PTTL")
            .arg(self.namespaced(key))
            .query_async(&mut conn)
            .await?;
        // -2: missing key, -1: no expiry.
        Ok(u64::try_from(pttl).ok().map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_conversion() {
        assert!(matches!(millis(Duration::ZERO), Err(CacheError::InvalidTtl)));
        assert_eq!(millis(Duration::from_micros(10)).unwrap(), 1);
        assert_eq!(millis(Duration::from_secs(2)).unwrap(), 2_000);
    }

    #[test]
    fn decode_parses_json_strings() {
        assert_eq!(decode(None).unwrap(), None);
        assert_eq!(
            decode(Some("{\"a\":1}".to_string())).unwrap(),
            Some(serde_json::json!({"a": 1}))
        );
        assert!(decode(Some("not json".to_string())).is_err());
    }

    #[tokio::test]
    async fn connect_to_unreachable_server_fails() {
        let result =
            RedisCache::connect("redis://127.0.0.1:1/", RedisCacheOptions::default()).await;
        assert!(matches!(result, Err(CacheError::Redis(_))));
    }

    #[tokio::test]
    async fn invalid_url_fails() {
        let result = RedisCache::connect("not-a-url", RedisCacheOptions::default()).await;
        assert!(result.is_err());
    }
}
