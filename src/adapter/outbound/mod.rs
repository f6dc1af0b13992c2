//! Outbound adapters: cache backends and sync buses.

pub mod local;
pub mod redis;
