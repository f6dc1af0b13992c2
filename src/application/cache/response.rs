//! Response caching for read-only HTTP handlers.
//!
//! Framework-agnostic: the caller maps its request into a [`CachedRequest`]
//! and its handler into a future yielding a [`JsonResponse`].

use std::fmt;
use std::future::Future;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::port::CacheService;

/// The parts of a request that select a cached response.
#[derive(Debug, Clone, Default)]
pub struct CachedRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub user_id: Option<String>,
}

impl CachedRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// A JSON response as stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonResponse {
    pub status: u16,
    pub body: Value,
}

impl JsonResponse {
    #[must_use]
    pub const fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    #[must_use]
    pub const fn ok(body: Value) -> Self {
        Self::new(200, body)
    }
}

/// How query parameters contribute to the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QueryKeyMode {
    #[default]
    Ignore,
    All,
    Only(Vec<String>),
}

/// Whether a response came from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    /// The request was not eligible for caching.
    Bypass,
}

impl CacheStatus {
    /// Value for an `X-Cache` response header.
    #[must_use]
    pub const fn as_header(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Bypass => "BYPASS",
        }
    }
}

/// Extra condition a response must meet to be stored.
pub type ResponsePredicate = Arc<dyn Fn(&JsonResponse) -> bool + Send + Sync>;

/// Configuration for a [`ResponseCache`].
#[derive(Clone)]
pub struct ResponseCacheOptions {
    pub prefix: String,
    /// `None` uses the cache's default TTL.
    pub ttl: Option<Duration>,
    /// Include the user id in the key.
    pub per_user: bool,
    pub query: QueryKeyMode,
    pub cacheable_status: RangeInclusive<u16>,
    pub predicate: Option<ResponsePredicate>,
}

impl Default for ResponseCacheOptions {
    fn default() -> Self {
        Self {
            prefix: "response".to_string(),
            ttl: None,
            per_user: false,
            query: QueryKeyMode::Ignore,
            cacheable_status: 200..=299,
            predicate: None,
        }
    }
}

impl fmt::Debug for ResponseCacheOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCacheOptions")
            .field("prefix", &self.prefix)
            .field("ttl", &self.ttl)
            .field("per_user", &self.per_user)
            .field("query", &self.query)
            .field("cacheable_status", &self.cacheable_status)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

/// Caches GET handler responses by path, user and query.
pub struct ResponseCache {
    cache: Arc<dyn CacheService>,
    options: ResponseCacheOptions,
}

impl ResponseCache {
    #[must_use]
    pub fn new(cache: Arc<dyn CacheService>, options: ResponseCacheOptions) -> Self {
        Self { cache, options }
    }

    fn path_key(&self, path: &str) -> String {
        format!("{}:{}", self.options.prefix, path)
    }

    /// Cache key for `request`: `{prefix}:{path}[:user:{id}][:{k=v&...}]`.
    #[must_use]
    pub fn key_for(&self, request: &CachedRequest) -> String {
        let mut key = self.path_key(&request.path);

        if self.options.per_user {
            if let Some(user) = &request.user_id {
                key.push_str(":user:");
                key.push_str(user);
            }
        }

        let mut params: Vec<&(String, String)> = match &self.options.query {
            QueryKeyMode::Ignore => Vec::new(),
            QueryKeyMode::All => request.query.iter().collect(),
            QueryKeyMode::Only(names) => request
                .query
                .iter()
                .filter(|(k, _)| names.contains(k))
                .collect(),
        };
        if !params.is_empty() {
            params.sort();
            let query = params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&");
            key.push(':');
            key.push_str(&query);
        }
        key
    }

    fn is_cacheable(&self, response: &JsonResponse) -> bool {
        self.options.cacheable_status.contains(&response.status)
            && self.options.predicate.as_ref().map_or(true, |p| p(response))
    }

    /// Serve `request` from the cache or run `handler` and store its response.
    ///
    /// Cache failures are logged and the handler runs as if on a miss.
    pub async fn handle<F, Fut>(&self, request: &CachedRequest, handler: F) -> (JsonResponse, CacheStatus)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = JsonResponse>,
    {
        if !request.method.eq_ignore_ascii_case("GET") {
            return (handler().await, CacheStatus::Bypass);
        }

        let key = self.key_for(request);
        match self.cache.get(&key).await {
            Ok(Some(cached)) => match serde_json::from_value::<JsonResponse>(cached) {
                Ok(response) => {
                    debug!(key = %key, "Response cache hit");
                    return (response, CacheStatus::Hit);
                }
                Err(e) => warn!(key = %key, error = %e, "Discarding malformed cached response"),
            },
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "Response cache read failed"),
        }

        let response = handler().await;
        if self.is_cacheable(&response) {
            match serde_json::to_value(&response) {
                Ok(value) => {
                    if let Err(e) = self.cache.set(&key, value, self.options.ttl).await {
                        warn!(key = %key, error = %e, "Response cache write failed");
                    }
                }
                Err(e) => warn!(key = %key, error = %e, "Failed to serialize response"),
            }
        }
        (response, CacheStatus::Miss)
    }

    /// Remove every cached variant of `path`. Returns the number removed.
    pub async fn invalidate(&self, path: &str) -> usize {
        let base = self.path_key(path);
        let keys = match self.cache.stats().await {
            Ok(stats) => stats.keys,
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to list cached responses");
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys
            .iter()
            .filter(|k| *k == &base || k.strip_prefix(base.as_str()).is_some_and(|r| r.starts_with(':')))
        {
            match self.cache.delete(key).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => warn!(key = %key, error = %e, "Failed to invalidate cached response"),
            }
        }
        debug!(path = %path, removed, "Invalidated cached responses");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::cache::MemoryCache;
    use serde_json::json;

    fn response_cache(options: ResponseCacheOptions) -> ResponseCache {
        ResponseCache::new(Arc::new(MemoryCache::default()), options)
    }

    #[test]
    fn key_includes_user_and_sorted_query() {
        let cache = response_cache(ResponseCacheOptions {
            per_user: true,
            query: QueryKeyMode::All,
            ..ResponseCacheOptions::default()
        });
        let request = CachedRequest::get("/api/pools")
            .with_query("sort", "tvl")
            .with_query("limit", "10")
            .with_user("42");
        assert_eq!(
            cache.key_for(&request),
            "response:/api/pools:user:42:limit=10&sort=tvl"
        );
    }

    #[test]
    fn key_selects_listed_query_params() {
        let cache = response_cache(ResponseCacheOptions {
            query: QueryKeyMode::Only(vec!["pair".to_string()]),
            ..ResponseCacheOptions::default()
        });
        let request = CachedRequest::get("/api/price")
            .with_query("pair", "XP-USDT")
            .with_query("nonce", "123")
            .with_user("7");
        assert_eq!(cache.key_for(&request), "response:/api/price:pair=XP-USDT");
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache() {
        let cache = response_cache(ResponseCacheOptions::default());
        let request = CachedRequest::get("/api/tokens");

        let (first, status) = cache
            .handle(&request, || async { JsonResponse::ok(json!(["XP"])) })
            .await;
        assert_eq!(status, CacheStatus::Miss);

        let (second, status) = cache
            .handle(&request, || async { JsonResponse::ok(json!(["changed"])) })
            .await;
        assert_eq!(status, CacheStatus::Hit);
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn error_responses_are_not_cached() {
        let cache = response_cache(ResponseCacheOptions::default());
        let request = CachedRequest::get("/api/tokens");

        cache
            .handle(&request, || async { JsonResponse::new(500, json!({"error": "boom"})) })
            .await;
        let (_, status) = cache
            .handle(&request, || async { JsonResponse::ok(json!([])) })
            .await;
        assert_eq!(status, CacheStatus::Miss);
    }

    #[tokio::test]
    async fn predicate_can_veto_storage() {
        let cache = response_cache(ResponseCacheOptions {
            predicate: Some(Arc::new(|r: &JsonResponse| r.body.as_array().is_some_and(|a| !a.is_empty()))),
            ..ResponseCacheOptions::default()
        });
        let request = CachedRequest::get("/api/tokens");

        cache.handle(&request, || async { JsonResponse::ok(json!([])) }).await;
        let (_, status) = cache
            .handle(&request, || async { JsonResponse::ok(json!([1])) })
            .await;
        assert_eq!(status, CacheStatus::Miss);
    }

    #[tokio::test]
    async fn non_get_requests_bypass() {
        let cache = response_cache(ResponseCacheOptions::default());
        let request = CachedRequest {
            method: "POST".to_string(),
            ..CachedRequest::get("/api/swap")
        };
        let (_, status) = cache
            .handle(&request, || async { JsonResponse::ok(json!({})) })
            .await;
        assert_eq!(status, CacheStatus::Bypass);
        assert_eq!(status.as_header(), "BYPASS");
    }

    #[tokio::test]
    async fn invalidate_removes_every_variant_of_a_path() {
        let cache = response_cache(ResponseCacheOptions {
            query: QueryKeyMode::All,
            ..ResponseCacheOptions::default()
        });
        for page in ["1", "2"] {
            let request = CachedRequest::get("/api/pools").with_query("page", page);
            cache.handle(&request, || async { JsonResponse::ok(json!([])) }).await;
        }
        cache
            .handle(&CachedRequest::get("/api/pools/archived"), || async {
                JsonResponse::ok(json!([]))
            })
            .await;

        assert_eq!(cache.invalidate("/api/pools").await, 2);
        let (_, status) = cache
            .handle(&CachedRequest::get("/api/pools/archived"), || async {
                JsonResponse::ok(json!([]))
            })
            .await;
        assert_eq!(status, CacheStatus::Hit);
    }
}
