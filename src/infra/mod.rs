//! Infrastructure: configuration loading.

pub mod config;

pub use config::{ServerConfig, StoreConfig};
