//! Infrastructure configuration modules.

pub mod cache;
pub mod cluster;
pub mod logging;
pub mod settings;
pub mod thresholds;
