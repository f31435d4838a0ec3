//! Startup configuration validation.
//!
//! Collects every problem at once instead of failing on the first, so an
//! operator can fix a config file in a single pass.

use super::Config;

/// Validate a loaded configuration. Returns all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.auth.token_secret.is_empty() {
        errors.push("auth.token_secret must not be empty".to_string());
    }

    if config.server.heartbeat_interval_secs < 5 {
        errors.push(format!(
            "server.heartbeat_interval_secs must be at least 5 (got {})",
            config.server.heartbeat_interval_secs
        ));
    }

    if config.server.outbound_queue == 0 {
        errors.push("server.outbound_queue must be at least 1".to_string());
    }

    if config.presence.palette.is_empty() {
        errors.push("presence.palette must contain at least one color".to_string());
    }
    for color in &config.presence.palette {
        if !is_hex_color(color) {
            errors.push(format!(
                "presence.palette entry {:?} is not a #rrggbb color",
                color
            ));
        }
    }

    if config.database.path.trim().is_empty() {
        errors.push("database.path must not be empty".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}
