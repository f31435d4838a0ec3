//! The Hub - central shared state for the collaboration server.
//!
//! The Hub owns the presence registry (behind one lock, see
//! [`Registry`](crate::state::Registry)), the live session handles, and the
//! fan-out machinery. Registry operations run inside the critical section
//! and return [`Emit`] lists; `deliver` sends them afterwards, so no socket
//! write ever happens while the lock is held.
//!
//! # Session handles
//!
//! Each connection task registers a [`SessionHandle`] keyed by session id
//! on accept; authentication later binds a user id to it. Dropping the
//! handle's sender terminates the connection task, which is how the
//! disconnect path closes transports without touching sockets directly.

use crate::config::Config;
use crate::db::Database;
use crate::metrics;
use crate::state::color::ColorAssigner;
use crate::state::lifecycle::LifecycleManager;
use crate::state::registry::{Emit, Registry, Scope};
use canvas_proto::ServerFrame;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// What a connection task may be asked to do, through its outbound queue.
#[derive(Debug)]
pub enum Outbound {
    /// Write a pre-serialized JSON frame. Frames are encoded once per
    /// broadcast, not once per recipient.
    Frame(Arc<String>),
    /// Send a transport-level liveness probe.
    Ping,
    /// Close the transport and end the task.
    Close,
}

/// Handle to one live connection task.
pub struct SessionHandle {
    /// Outbound queue feeding the task's single socket writer.
    pub tx: mpsc::Sender<Outbound>,
    /// Liveness flag: set by Pong receipt, cleared by each monitor tick.
    pub alive: AtomicBool,
    /// Bound after a successful auth; a session authenticates exactly once.
    pub user_id: OnceLock<String>,
}

/// Central shared state container.
pub struct Hub {
    /// The authoritative presence maps. One coarse lock; every multi-step
    /// selection/lock sequence is atomic under it.
    pub registry: RwLock<Registry>,
    /// Live sessions by session id, pre-auth sessions included.
    sessions: DashMap<Uuid, Arc<SessionHandle>>,
    /// userId -> session id. Each user has at most one live session.
    user_index: DashMap<String, Uuid>,
    /// Display color assignment.
    pub colors: ColorAssigner,
    /// Shutdown and forced-disconnect signaling.
    pub lifecycle: LifecycleManager,
    /// Identity and access-control lookups.
    pub db: Database,
    /// Shared secret for bearer token validation.
    pub token_secret: String,
    /// Liveness probe period.
    pub heartbeat_interval: Duration,
    /// Capacity for per-session outbound queues.
    pub outbound_queue: usize,
}

impl Hub {
    /// Create a new Hub from the loaded configuration.
    pub fn new(
        config: &Config,
        db: Database,
        disconnect_tx: mpsc::Sender<crate::state::DisconnectRequest>,
    ) -> Self {
        Self {
            registry: RwLock::new(Registry::new()),
            sessions: DashMap::new(),
            user_index: DashMap::new(),
            colors: ColorAssigner::new(config.presence.palette.clone()),
            lifecycle: LifecycleManager::new(disconnect_tx),
            db,
            token_secret: config.auth.token_secret.clone(),
            heartbeat_interval: Duration::from_secs(config.server.heartbeat_interval_secs),
            outbound_queue: config.server.outbound_queue,
        }
    }

    /// Register a freshly accepted connection.
    pub fn register_session(&self, session_id: Uuid, tx: mpsc::Sender<Outbound>) {
        let handle = Arc::new(SessionHandle {
            tx,
            alive: AtomicBool::new(true),
            user_id: OnceLock::new(),
        });
        self.sessions.insert(session_id, handle);
        metrics::CONNECTED_SESSIONS.inc();
    }

    /// Bind an authenticated user to their session.
    pub fn bind_user(&self, session_id: Uuid, user_id: &str) {
        if let Some(handle) = self.sessions.get(&session_id) {
            let _ = handle.user_id.set(user_id.to_string());
        }
        self.user_index.insert(user_id.to_string(), session_id);
        metrics::ACTIVE_USERS.inc();
    }

    /// The session currently bound to a user, if any.
    pub fn session_for_user(&self, user_id: &str) -> Option<Uuid> {
        self.user_index.get(user_id).map(|entry| *entry.value())
    }

    /// Mark a session alive; called on Pong receipt.
    pub fn mark_alive(&self, session_id: Uuid) {
        if let Some(handle) = self.sessions.get(&session_id) {
            handle.alive.store(true, Ordering::Relaxed);
        }
    }

    /// Snapshot of live sessions for the liveness monitor.
    pub fn sessions_snapshot(&self) -> Vec<(Uuid, Arc<SessionHandle>)> {
        self.sessions
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect()
    }

    /// Ask the disconnect worker to tear a session down.
    pub fn request_disconnect(&self, session_id: Uuid, reason: &str) {
        self.lifecycle.request_disconnect(session_id, reason);
    }

    /// Tear a session down through the same path as a clean disconnect:
    ///
    /// 1. Unregister the handle (idempotence guard).
    /// 2. If a user was bound: run the registry cleanup (lock releases and
    ///    `user:leave` to the prior space) and deliver the broadcasts.
    /// 3. Close the transport by signaling the task and dropping its sender.
    pub fn disconnect_session(&self, session_id: Uuid, reason: &str) {
        let Some((_, handle)) = self.sessions.remove(&session_id) else {
            return;
        };
        metrics::CONNECTED_SESSIONS.dec();

        if let Some(user_id) = handle.user_id.get() {
            // Only unbind the user if the binding still points at this
            // session; a replacement session may own the id by now.
            let owned = self
                .user_index
                .remove_if(user_id, |_, bound| *bound == session_id)
                .is_some();
            if owned {
                let emits = {
                    let mut registry = self.registry.write();
                    registry.remove_user(user_id)
                };
                self.deliver(emits);
                metrics::ACTIVE_USERS.dec();
            }
            info!(user = %user_id, session = %session_id, reason = reason, "Session disconnected");
        } else {
            debug!(session = %session_id, reason = reason, "Unauthenticated session closed");
        }

        let _ = handle.tx.try_send(Outbound::Close);
    }

    /// Deliver registry emissions, in order, outside the critical section.
    pub fn deliver(&self, emits: Vec<Emit>) {
        for emit in emits {
            match emit.scope {
                Scope::User(user_id) => {
                    if let Some(json) = encode_frame(&emit.frame) {
                        self.send_raw(&user_id, json);
                    }
                }
                Scope::Space { space_id, exclude } => {
                    self.broadcast_to_space(&space_id, &emit.frame, exclude.as_deref());
                }
            }
        }
    }

    /// Deliver a frame to every session currently in a space, optionally
    /// excluding the originator. Serializes once; recipients are snapshotted
    /// under the read lock, sends happen after it is released. Deliberately
    /// free of per-recipient logging: this sits on the cursor hot path.
    pub fn broadcast_to_space(&self, space_id: &str, frame: &ServerFrame, exclude: Option<&str>) {
        let Some(json) = encode_frame(frame) else {
            return;
        };
        let recipients: Vec<String> = {
            let registry = self.registry.read();
            registry
                .members_of(space_id)
                .into_iter()
                .filter(|uid| Some(uid.as_str()) != exclude)
                .collect()
        };
        for user_id in recipients {
            self.send_raw(&user_id, Arc::clone(&json));
            metrics::BROADCAST_DELIVERIES.inc();
        }
    }

    /// Enqueue one frame for one user's session, without blocking.
    ///
    /// A full queue means the client has stopped draining its socket; per
    /// the send-buffer policy such a session is terminated as unresponsive
    /// rather than allowed to stall every broadcaster behind it.
    fn send_raw(&self, user_id: &str, json: Arc<String>) {
        let Some(session_id) = self.session_for_user(user_id) else {
            return;
        };
        let Some(tx) = self.sessions.get(&session_id).map(|h| h.tx.clone()) else {
            return;
        };
        match tx.try_send(Outbound::Frame(json)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(user = %user_id, session = %session_id, "Outbound queue full - terminating unresponsive session");
                self.lifecycle
                    .request_disconnect(session_id, "outbound queue full");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(user = %user_id, "Dropping frame for closed session");
            }
        }
    }
}

/// Serialize a frame once for fan-out.
pub fn encode_frame(frame: &ServerFrame) -> Option<Arc<String>> {
    match serde_json::to_string(frame) {
        Ok(json) => Some(Arc::new(json)),
        Err(e) => {
            error!(frame = frame.frame_type(), error = %e, "Failed to serialize frame");
            None
        }
    }
}
