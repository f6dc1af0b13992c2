//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! # Available Ports
//!
//! - [`CacheService`] - Key-value cache shared by the memory, Redis and hybrid tiers
//! - [`MessageBus`] - Pub/sub transport for cross-node cache sync events

mod bus;
mod cache;

pub use bus::MessageBus;
pub use cache::{CacheService, CacheServiceExt, CacheStats};
