//! Factory modules for building infrastructure components.
//!
//! Provides factory functions that construct fully-configured infrastructure
//! components from application configuration. These factories handle
//! dependency injection and wiring.
//!
//! # Submodules
//!
//! - [`cache`] - Cache backend and cluster sync construction

pub mod cache;

pub use cache::{build_cache, CacheRuntime};
