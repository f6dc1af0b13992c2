//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`cache`] - `FailingCache`, a [`CacheService`](crate::port::CacheService)
//!   whose every operation errors.
//! - [`bus`] - `RecordingBus`, a [`MessageBus`](crate::port::MessageBus) that
//!   records published events.
//! - [`domain`] - Builders for trade requests and trade windows.
//! - [`config`] - Canonical test configurations.

pub mod bus;
pub mod cache;
pub mod config;
pub mod domain;
