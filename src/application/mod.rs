//! Application services (use cases).
//!
//! These services apply domain rules and coordinate adapters through ports.

pub mod cache;
pub mod risk;
