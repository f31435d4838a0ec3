//! Configuration type definitions.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

use super::defaults::{default_heartbeat_interval, default_outbound_queue, default_palette};

/// Top-level configuration, loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server identity and listener configuration.
    pub server: ServerConfig,
    /// Credential validation configuration.
    pub auth: AuthConfig,
    /// Database configuration for user/space lookups.
    pub database: DatabaseConfig,
    /// Presence configuration (display palette).
    #[serde(default)]
    pub presence: PresenceConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(Path::new(path))?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// WebSocket listen address, e.g. `127.0.0.1:4000`.
    pub listen: SocketAddr,
    /// Prometheus metrics port. Convention: 0 disables the endpoint
    /// (used by tests); unset falls back to 9090.
    pub metrics_port: Option<u16>,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
    /// Heartbeat period in seconds. Sessions that miss a full period
    /// without answering the probe are torn down.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
    /// Capacity of each session's outbound frame queue.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Structured JSON lines, for log aggregation.
    Json,
    /// Human-readable output.
    #[default]
    Pretty,
}

/// Credential validation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for bearer token validation (HS256).
    pub token_secret: String,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub path: String,
}

/// Presence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceConfig {
    /// Display colors assigned to concurrently active users.
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            palette: default_palette(),
        }
    }
}
