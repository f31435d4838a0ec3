//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, ...)
//! - [`defaults`]: serde default functions
//! - [`validation`]: Startup validation pass

mod defaults;
mod types;
mod validation;

pub use types::{
    AuthConfig, Config, DatabaseConfig, LogFormat, PresenceConfig, ServerConfig,
};
pub use validation::validate;
