//! Lifecycle management state and behavior.
//!
//! Isolates server lifecycle events (shutdown, forced disconnects) from the
//! main Hub struct.

use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

/// A request to tear a session down through the normal disconnect path.
#[derive(Debug)]
pub struct DisconnectRequest {
    /// The session to tear down.
    pub session_id: Uuid,
    /// Reason, for the logs only; peers never see it.
    pub reason: String,
}

/// Lifecycle management state.
///
/// The LifecycleManager handles:
/// - Server shutdown signaling
/// - Session disconnect requests from the liveness monitor
pub struct LifecycleManager {
    /// Shutdown signal broadcaster. Every connection task subscribes.
    pub shutdown_tx: broadcast::Sender<()>,

    /// Disconnect request channel. Bounded so a disconnect storm applies
    /// backpressure instead of growing memory.
    disconnect_tx: mpsc::Sender<DisconnectRequest>,
}

impl LifecycleManager {
    pub fn new(disconnect_tx: mpsc::Sender<DisconnectRequest>) -> Self {
        // Capacity 16 provides buffer for multiple slow subscribers during shutdown
        let (shutdown_tx, _) = broadcast::channel(16);

        Self {
            shutdown_tx,
            disconnect_tx,
        }
    }

    /// Request a session disconnect.
    ///
    /// Non-blocking: if the channel is full the request is dropped, which is
    /// acceptable since the disconnect worker will catch the session on a
    /// later heartbeat tick.
    pub fn request_disconnect(&self, session_id: Uuid, reason: &str) {
        let _ = self.disconnect_tx.try_send(DisconnectRequest {
            session_id,
            reason: reason.to_string(),
        });
    }
}
