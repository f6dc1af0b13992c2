//! A cache that is never reachable.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{CacheError, CacheResult};
use crate::port::{CacheService, CacheStats};

/// Every operation fails with [`CacheError::Unavailable`].
///
/// Stands in for a remote tier that is down, so tests can check that
/// composing layers log and degrade instead of propagating.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingCache;

fn unavailable<T>() -> CacheResult<T> {
    Err(CacheError::Unavailable("failing cache".to_string()))
}

#[async_trait]
impl CacheService for FailingCache {
    async fn set(&self, _key: &str, _value: Value, _ttl: Option<Duration>) -> CacheResult<()> {
        unavailable()
    }

    async fn get(&self, _key: &str) -> CacheResult<Option<Value>> {
        unavailable()
    }

    async fn has(&self, _key: &str) -> CacheResult<bool> {
        unavailable()
    }

    async fn delete(&self, _key: &str) -> CacheResult<bool> {
        unavailable()
    }

    async fn clear(&self) -> CacheResult<()> {
        unavailable()
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        unavailable()
    }

    async fn mset(&self, _entries: Vec<(String, Value)>, _ttl: Option<Duration>) -> CacheResult<()> {
        unavailable()
    }

    async fn mget(&self, _keys: &[String]) -> CacheResult<Vec<Option<Value>>> {
        unavailable()
    }

    async fn incr(&self, _key: &str, _by: i64) -> CacheResult<i64> {
        unavailable()
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> CacheResult<bool> {
        unavailable()
    }

    async fn ttl(&self, _key: &str) -> CacheResult<Option<Duration>> {
        unavailable()
    }
}
