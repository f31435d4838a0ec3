//! Liveness monitor: heartbeat-driven session reaping.
//!
//! One central periodic task. Each tick walks every live session,
//! pre-auth sessions included:
//!
//! 1. A session whose liveness flag is still false missed the whole
//!    previous period; it is torn down through the disconnect worker, the
//!    same path as a clean disconnect.
//! 2. Every remaining session has its flag cleared and receives a
//!    transport-level Ping. The Pong receipt sets the flag again; no
//!    application frame is involved.

use crate::metrics;
use crate::state::{Hub, Outbound};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Spawn the periodic liveness task. Runs until shutdown.
pub fn spawn_liveness_monitor(hub: Arc<Hub>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(hub.heartbeat_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick fires immediately, we don't want that
        interval.tick().await;

        let mut shutdown_rx = hub.lifecycle.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let mut reaped = 0usize;
                    for (session_id, handle) in hub.sessions_snapshot() {
                        if !handle.alive.swap(false, Ordering::Relaxed) {
                            reaped += 1;
                            metrics::HEARTBEAT_DISCONNECTS.inc();
                            warn!(session = %session_id, "Heartbeat missed - terminating session");
                            hub.request_disconnect(session_id, "heartbeat timeout");
                        } else {
                            // Queue full means the session is already wedged;
                            // it will fail the next tick.
                            let _ = handle.tx.try_send(Outbound::Ping);
                        }
                    }
                    if reaped > 0 {
                        debug!(count = reaped, "Liveness tick reaped sessions");
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }
    });
}
