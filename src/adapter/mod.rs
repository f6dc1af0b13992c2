//! Implementations of ports (hexagonal adapters).
//!
//! - [`inbound`] - The command-line interface
//! - [`outbound`] - Redis and in-process implementations of the cache ports

pub mod inbound;
pub mod outbound;
