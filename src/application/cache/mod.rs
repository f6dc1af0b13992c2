//! Cache tiers, cross-node sync and caching combinators.
//!
//! - [`memory::MemoryCache`]: bounded in-process store with TTL and eviction
//! - [`hybrid::HybridCache`]: memory in front of an optional remote tier
//! - [`sync::SyncManager`] / [`sync::SyncedCache`]: mutation propagation over a bus
//! - [`response::ResponseCache`]: GET response caching
//! - [`memoize::Cacheable`]: memoization of async functions

pub mod eviction;
pub mod hybrid;
pub mod memoize;
pub mod memory;
pub mod response;
pub mod sync;

pub use eviction::EvictionPolicy;
pub use hybrid::HybridCache;
pub use memoize::{Cacheable, CachedFn};
pub use memory::{MemoryCache, MemoryCacheOptions};
pub use response::{
    CacheStatus, CachedRequest, JsonResponse, QueryKeyMode, ResponseCache, ResponseCacheOptions,
};
pub use sync::{SyncManager, SyncedCache};
