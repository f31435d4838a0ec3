//! Handler context and per-session state.

use crate::error::HandlerError;
use crate::state::{Hub, Outbound, encode_frame};
use canvas_proto::ServerFrame;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Identity a session acquires on successful auth.
///
/// Presence of this struct *is* the AUTHENTICATED state: `SessionState`
/// holds `None` until the handshake completes, and it is set exactly once.
/// Color and cursor live in the registry's presence entry, not here.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub user_name: String,
}

/// State owned by one connection task, mutated only by its own handlers.
#[derive(Debug, Default)]
pub struct SessionState {
    identity: Option<Identity>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// The session's identity, or `AuthRequired`.
    pub fn identity(&self) -> Result<&Identity, HandlerError> {
        self.identity.as_ref().ok_or(HandlerError::AuthRequired)
    }

    /// Record the authenticated identity. Subsequent auth frames are
    /// ignored by the auth handler, so this is called at most once.
    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }
}

/// Context passed to each frame handler.
pub struct Context<'a> {
    /// This connection's session id.
    pub session_id: Uuid,
    /// Shared server state.
    pub hub: &'a Arc<Hub>,
    /// This session's state.
    pub state: &'a mut SessionState,
    /// Remote address of the client.
    pub remote_addr: SocketAddr,
    /// Outbound queue of this session, for direct replies.
    pub outbound: &'a mpsc::Sender<Outbound>,
}

impl Context<'_> {
    /// Send a frame to the originating session.
    ///
    /// Non-blocking: a session whose outbound queue is full is wedged, and
    /// a handler must never stall on it (the queue is drained by the same
    /// task that runs the handler).
    pub fn send(&self, frame: &ServerFrame) -> Result<(), HandlerError> {
        let json = encode_frame(frame)
            .ok_or_else(|| HandlerError::Internal("frame serialization failed".to_string()))?;
        self.outbound.try_send(Outbound::Frame(json))?;
        Ok(())
    }
}
