//! Configuration types for the token query server.
//!
//! This crate provides:
//! - Server settings (listen address, RPC endpoint, timeouts)
//! - TOML file loading and validation

pub mod settings;

pub use settings::{Config, ConfigError, LogFormat};
