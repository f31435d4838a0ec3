//! Unified error handling for canvasd.
//!
//! Every failure a frame handler can produce is a [`HandlerError`]. Errors
//! are surfaced as an `error` frame on the originating session only; they
//! never close the session and never reach other peers. Internal kinds
//! (send failures, bugs) are logged but produce no client-visible frame.

use crate::state::Outbound;
use canvas_proto::ServerFrame;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur while handling a client frame.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Operation attempted before a successful `auth`.
    #[error("authentication required")]
    AuthRequired,

    /// Bad or expired token, or the token's user is unknown.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Non-special space id not present in the store.
    #[error("space not found: {0}")]
    SpaceNotFound(String),

    /// The user lacks access to a non-public space.
    #[error("access denied to space {0}")]
    AccessDenied(String),

    /// Explicit lock or select against a card held by another user.
    #[error("card {0} is locked by another user")]
    LockConflict(String),

    /// Non-JSON input, or a frame with a missing/unknown `type`.
    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("send error: {0}")]
    Send(#[from] mpsc::error::TrySendError<Outbound>),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AuthRequired => "auth_required",
            Self::AuthFailed(_) => "auth_failed",
            Self::SpaceNotFound(_) => "space_not_found",
            Self::AccessDenied(_) => "access_denied",
            Self::LockConflict(_) => "lock_conflict",
            Self::Malformed(_) => "malformed_frame",
            Self::Send(_) => "send_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Convert to the client-visible `error` frame.
    ///
    /// Returns `None` for errors that don't warrant a reply (send failures,
    /// internal errors). The message texts are part of the protocol; the
    /// detail carried by the variant stays in the logs.
    pub fn to_error_frame(&self) -> Option<ServerFrame> {
        let message = match self {
            Self::AuthRequired => "Authentication required",
            Self::AuthFailed(_) => "Authentication failed",
            Self::SpaceNotFound(_) => "Space not found",
            Self::AccessDenied(_) => "Access denied to this space",
            Self::LockConflict(_) => "Card is already locked by another user",
            Self::Malformed(_) => "Invalid message format",
            Self::Send(_) | Self::Internal(_) => return None,
        };
        Some(ServerFrame::Error {
            message: message.to_string(),
        })
    }
}

/// Result type for frame handlers.
pub type HandlerResult = Result<(), HandlerError>;
