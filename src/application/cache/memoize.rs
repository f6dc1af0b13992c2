//! Function-level memoization backed by a [`CacheService`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use xpguard::application::cache::{Cacheable, MemoryCache};
//!
//! # async fn demo() {
//! let cache = Arc::new(MemoryCache::default());
//! let price = Cacheable::new(|pair: &String| format!("price:{pair}"))
//!     .ttl(Duration::from_secs(5))
//!     .wrap(cache, |pair: String| async move { pair.len() as f64 });
//! let value = price.call("XP-USDT".to_string()).await;
//! # }
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::port::CacheService;

type KeyFn<A> = Box<dyn Fn(&A) -> String + Send + Sync>;
type Predicate<R> = Box<dyn Fn(&R) -> bool + Send + Sync>;

/// Memoization settings: a key function, a TTL and an optional predicate.
pub struct Cacheable<A, R> {
    key_fn: KeyFn<A>,
    ttl: Option<Duration>,
    predicate: Option<Predicate<R>>,
}

impl<A, R> Cacheable<A, R> {
    /// Memoize under the key produced by `key_fn`.
    pub fn new(key_fn: impl Fn(&A) -> String + Send + Sync + 'static) -> Self {
        Self {
            key_fn: Box::new(key_fn),
            ttl: None,
            predicate: None,
        }
    }

    /// Override the cache's default TTL.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Only store results for which `predicate` returns `true`.
    #[must_use]
    pub fn when(mut self, predicate: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Wrap `f` so its results are memoized in `cache`.
    pub fn wrap<F, Fut>(self, cache: Arc<dyn CacheService>, f: F) -> CachedFn<A, R, F>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = R>,
    {
        CachedFn {
            settings: self,
            cache,
            f,
            _marker: PhantomData,
        }
    }
}

/// A memoized async function produced by [`Cacheable::wrap`].
///
/// Cache failures never reach the caller: a failed read runs the function,
/// a failed write is logged.
pub struct CachedFn<A, R, F> {
    settings: Cacheable<A, R>,
    cache: Arc<dyn CacheService>,
    f: F,
    _marker: PhantomData<fn(A) -> R>,
}

impl<A, R, F, Fut> CachedFn<A, R, F>
where
    F: Fn(A) -> Fut,
    Fut: Future<Output = R>,
    R: Serialize + DeserializeOwned,
{
    /// Return the cached result for `args`, or compute and store it.
    pub async fn call(&self, args: A) -> R {
        let key = (self.settings.key_fn)(&args);

        match self.cache.get(&key).await {
            Ok(Some(value)) => match serde_json::from_value::<R>(value) {
                Ok(result) => {
                    debug!(key = %key, "Memoized result hit");
                    return result;
                }
                Err(e) => warn!(key = %key, error = %e, "Cached result has unexpected shape"),
            },
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "Memoization cache read failed"),
        }

        let result = (self.f)(args).await;
        let store = self.settings.predicate.as_ref().map_or(true, |p| p(&result));
        if store {
            match serde_json::to_value(&result) {
                Ok(value) => {
                    if let Err(e) = self.cache.set(&key, value, self.settings.ttl).await {
                        warn!(key = %key, error = %e, "Memoization cache write failed");
                    }
                }
                Err(e) => warn!(key = %key, error = %e, "Failed to serialize result"),
            }
        }
        result
    }

    /// Drop the cached result for `args`.
    pub async fn invalidate(&self, args: &A) -> bool {
        let key = (self.settings.key_fn)(args);
        self.cache.delete(&key).await.unwrap_or_else(|e| {
            warn!(key = %key, error = %e, "Memoization cache delete failed");
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::cache::MemoryCache;
    use crate::testkit::cache::FailingCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn results_are_memoized_per_key() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let square = Cacheable::new(|n: &u64| format!("square:{n}")).wrap(
            Arc::new(MemoryCache::default()),
            move |n: u64| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { n * n }
            },
        );

        assert_eq!(square.call(4).await, 16);
        assert_eq!(square.call(4).await, 16);
        assert_eq!(square.call(5).await, 25);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(square.invalidate(&4).await);
        assert_eq!(square.call(4).await, 16);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn predicate_skips_unwanted_results() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let lookup = Cacheable::new(|id: &String| format!("pool:{id}"))
            .when(|found: &Option<u32>| found.is_some())
            .wrap(Arc::new(MemoryCache::default()), move |_id: String| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { None::<u32> }
            });

        assert_eq!(lookup.call("x".to_string()).await, None);
        assert_eq!(lookup.call("x".to_string()).await, None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cache_failures_fall_through() {
        let double = Cacheable::new(|n: &i32| n.to_string())
            .ttl(Duration::from_secs(1))
            .wrap(Arc::new(FailingCache), |n: i32| async move { n * 2 });
        assert_eq!(double.call(21).await, 42);
        assert!(!double.invalidate(&21).await);
    }
}
