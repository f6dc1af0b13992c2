//! Redis adapters: the remote cache tier and the pub/sub sync bus.

mod bus;
mod cache;

pub use bus::RedisBus;
pub use cache::{RedisCache, RedisCacheOptions};
