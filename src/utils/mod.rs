//! Configuration utilities.

/// Environment-based configuration loading.
pub mod config;

pub use config::Config;
