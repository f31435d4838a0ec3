//! Default values for configuration fields.

/// Default heartbeat period in seconds.
pub fn default_heartbeat_interval() -> u64 {
    30
}

/// Default capacity of a session's outbound frame queue.
pub fn default_outbound_queue() -> usize {
    256
}

/// The reference display palette: 12 colors, assigned in order.
pub fn default_palette() -> Vec<String> {
    [
        "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F",
        "#BB8FCE", "#85C1E9", "#F8B739", "#52BE80",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
