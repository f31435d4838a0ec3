//! Network layer: listener, per-connection tasks, liveness.

mod connection;
mod gateway;
mod liveness;

pub use connection::Connection;
pub use gateway::Gateway;
pub use liveness::spawn_liveness_monitor;
