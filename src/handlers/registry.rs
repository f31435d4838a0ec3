//! Frame handler registry and dispatch.
//!
//! Maps the wire `type` discriminator to a handler and absorbs handler
//! errors: each becomes an `error` frame on the originating session, a
//! debug log line, and a metrics label. Nothing a handler returns can close
//! the session or reach other peers.

use super::auth::AuthHandler;
use super::card::{CardDeselectHandler, CardLockHandler, CardSelectHandler, CardUnlockHandler};
use super::context::Context;
use super::cursor::CursorMoveHandler;
use super::events::EventRelayHandler;
use super::space::{SpaceJoinHandler, SpaceLeaveHandler};
use crate::error::{HandlerError, HandlerResult};
use crate::metrics;
use async_trait::async_trait;
use canvas_proto::ClientFrame;
use std::collections::HashMap;
use tracing::{Instrument, Level, debug, span};

/// A handler for one family of client frames.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &mut Context<'_>, frame: &ClientFrame) -> HandlerResult;
}

/// Registry of frame handlers.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
}

impl Registry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();

        handlers.insert("auth", Box::new(AuthHandler));

        handlers.insert("space:join", Box::new(SpaceJoinHandler));
        handlers.insert("space:leave", Box::new(SpaceLeaveHandler));

        handlers.insert("cursor:move", Box::new(CursorMoveHandler));

        handlers.insert("card:lock", Box::new(CardLockHandler));
        handlers.insert("card:unlock", Box::new(CardUnlockHandler));
        handlers.insert("card:select", Box::new(CardSelectHandler));
        handlers.insert("card:deselect", Box::new(CardDeselectHandler));

        // Mutation passthroughs all share the relay handler
        handlers.insert("card:created", Box::new(EventRelayHandler));
        handlers.insert("card:updated", Box::new(EventRelayHandler));
        handlers.insert("card:deleted", Box::new(EventRelayHandler));
        handlers.insert("connection:created", Box::new(EventRelayHandler));
        handlers.insert("connection:deleted", Box::new(EventRelayHandler));

        Self { handlers }
    }

    /// Dispatch a parsed frame to its handler.
    pub async fn dispatch(&self, ctx: &mut Context<'_>, frame: &ClientFrame) {
        let frame_type = frame.frame_type();
        metrics::record_frame(frame_type);

        // Before auth, only `auth` is accepted; the session stays open.
        if !ctx.state.is_authenticated() && frame_type != "auth" {
            self.report(ctx, frame_type, HandlerError::AuthRequired);
            return;
        }

        let Some(handler) = self.handlers.get(frame_type) else {
            // Unreachable once parsing succeeded; the enum is sealed.
            self.report(
                ctx,
                frame_type,
                HandlerError::Internal(format!("no handler for {frame_type}")),
            );
            return;
        };

        // Cursor frames are high-volume; skip the span machinery for them.
        let result = if matches!(frame, ClientFrame::CursorMove { .. }) {
            handler.handle(ctx, frame).await
        } else {
            let user = ctx.state.identity().ok().map(|i| i.user_name.as_str());
            let frame_span = span!(
                Level::DEBUG,
                "hub.frame",
                frame = frame_type,
                user = user,
                session = %ctx.session_id,
                remote_addr = %ctx.remote_addr,
            );
            handler.handle(ctx, frame).instrument(frame_span).await
        };

        if let Err(e) = result {
            self.report(ctx, frame_type, e);
        }
    }

    /// Surface a handler error on the originating session only.
    fn report(&self, ctx: &Context<'_>, frame_type: &str, error: HandlerError) {
        metrics::record_frame_error(frame_type, error.error_code());
        debug!(frame = frame_type, error = %error, "Frame error");
        if let Some(reply) = error.to_error_frame() {
            let _ = ctx.send(&reply);
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
