use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use xpguard::application::cache::{EvictionPolicy, HybridCache, MemoryCache};
use xpguard::error::CacheError;
use xpguard::port::{CacheService, CacheServiceExt};
use xpguard::testkit::cache::FailingCache;
use xpguard::testkit::config::memory_options;

fn bounded(max_size: usize, eviction: EvictionPolicy) -> MemoryCache {
    MemoryCache::new(memory_options(max_size, eviction))
}

async fn fill_and_touch(cache: &MemoryCache) {
    cache.set("a", json!(1), None).await.unwrap();
    cache.set("b", json!(2), None).await.unwrap();
    cache.get("a").await.unwrap();
    cache.set("c", json!(3), None).await.unwrap();
}

#[tokio::test]
async fn lru_evicts_least_recently_accessed() {
    let cache = bounded(2, EvictionPolicy::Lru);
    fill_and_touch(&cache).await;
    assert!(cache.has("a").await.unwrap());
    assert!(!cache.has("b").await.unwrap());
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn lfu_evicts_fewest_hits() {
    let cache = bounded(2, EvictionPolicy::Lfu);
    fill_and_touch(&cache).await;
    assert!(cache.has("a").await.unwrap());
    assert!(!cache.has("b").await.unwrap());
}

#[tokio::test]
async fn fifo_evicts_oldest_insert() {
    let cache = bounded(2, EvictionPolicy::Fifo);
    fill_and_touch(&cache).await;
    assert!(!cache.has("a").await.unwrap());
    assert!(cache.has("b").await.unwrap());
    assert!(cache.has("c").await.unwrap());
}

#[tokio::test]
async fn expired_entry_is_evicted_before_policy_victim() {
    let cache = bounded(2, EvictionPolicy::Lru);
    cache
        .set("short", json!(1), Some(Duration::from_millis(20)))
        .await
        .unwrap();
    cache.set("long", json!(2), None).await.unwrap();
    cache.get("short").await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    cache.set("new", json!(3), None).await.unwrap();

    assert!(cache.has("long").await.unwrap());
    assert!(cache.has("new").await.unwrap());
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn overwriting_a_key_never_evicts() {
    let cache = bounded(2, EvictionPolicy::Fifo);
    cache.set("a", json!(1), None).await.unwrap();
    cache.set("b", json!(2), None).await.unwrap();
    cache.set("a", json!(10), None).await.unwrap();
    assert_eq!(cache.mget(&["a".into(), "b".into()]).await.unwrap(), vec![
        Some(json!(10)),
        Some(json!(2))
    ]);
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let cache = MemoryCache::default();
    cache
        .set("k", json!("v"), Some(Duration::from_millis(20)))
        .await
        .unwrap();
    assert!(cache.ttl("k").await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(cache.get("k").await.unwrap(), None);
    assert_eq!(cache.ttl("k").await.unwrap(), None);
    assert!(!cache.expire("k", Duration::from_secs(1)).await.unwrap());
}

#[tokio::test]
async fn zero_ttl_is_rejected() {
    let cache = MemoryCache::default();
    let err = cache.set("k", json!(1), Some(Duration::ZERO)).await.unwrap_err();
    assert!(matches!(err, CacheError::InvalidTtl));
}

#[tokio::test]
async fn counters() {
    let cache = MemoryCache::default();
    assert_eq!(cache.incr("n", 5).await.unwrap(), 5);
    assert_eq!(cache.incr("n", 2).await.unwrap(), 7);
    assert_eq!(cache.decr("n", 10).await.unwrap(), -3);

    cache.set("s", json!("text"), None).await.unwrap();
    let err = cache.incr("s", 1).await.unwrap_err();
    assert!(matches!(err, CacheError::NotAnInteger { .. }));
}

#[tokio::test]
async fn stats_track_hits_until_clear() {
    let cache = MemoryCache::default();
    cache
        .mset(vec![("b".into(), json!(2)), ("a".into(), json!(1))], None)
        .await
        .unwrap();
    cache.get("a").await.unwrap();
    cache.get("a").await.unwrap();
    cache.get("missing").await.unwrap();

    let stats = cache.stats().await.unwrap();
    assert_eq!(stats.size, 2);
    assert_eq!(stats.keys, vec!["a".to_string(), "b".to_string()]);
    assert_eq!((stats.hits, stats.misses), (2, 1));
    assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);

    cache.clear().await.unwrap();
    cache.clear().await.unwrap();
    let stats = cache.stats().await.unwrap();
    assert_eq!((stats.size, stats.hits, stats.misses), (0, 0, 0));
}

#[tokio::test]
async fn typed_helpers_round_trip_structs() {
    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Pool {
        pair: String,
        tvl: f64,
    }

    let cache = MemoryCache::default();
    let pool = Pool {
        pair: "XP-USDT".to_string(),
        tvl: 1_250_000.0,
    };
    cache.set_as("pool:1", &pool, None).await.unwrap();
    let loaded: Option<Pool> = cache.get_as("pool:1").await.unwrap();
    assert_eq!(loaded, Some(pool));
}

#[tokio::test]
async fn sweeper_purges_without_reads() {
    let cache = Arc::new(MemoryCache::default());
    cache
        .set("k", json!(1), Some(Duration::from_millis(10)))
        .await
        .unwrap();
    let sweeper = cache.spawn_sweeper(Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(cache.is_empty());
    sweeper.abort();
}

#[tokio::test]
async fn hybrid_reads_through_and_survives_a_dead_remote() {
    let remote = Arc::new(MemoryCache::default());
    remote.set("shared", json!({"v": 1}), None).await.unwrap();
    let hybrid = HybridCache::connect(Arc::new(MemoryCache::default()), remote.clone()).await;
    assert!(hybrid.has_remote());
    assert_eq!(hybrid.get("shared").await.unwrap(), Some(json!({"v": 1})));
    assert!(hybrid.memory().has("shared").await.unwrap());

    let degraded =
        HybridCache::connect(Arc::new(MemoryCache::default()), Arc::new(FailingCache)).await;
    assert!(!degraded.has_remote());
    degraded.set("k", json!(1), None).await.unwrap();
    assert_eq!(degraded.get("k").await.unwrap(), Some(json!(1)));
}

#[tokio::test]
async fn concurrent_writers_respect_the_bound() {
    let cache = Arc::new(bounded(50, EvictionPolicy::Lru));
    let mut tasks = Vec::new();
    for worker in 0..8 {
        let cache = cache.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..100 {
                let key = format!("w{worker}:{i}");
                cache.set(&key, json!(i), None).await.unwrap();
                cache.get(&key).await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(cache.len(), 50);
}
