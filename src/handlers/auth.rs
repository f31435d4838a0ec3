//! Authentication handshake.
//!
//! `auth` must be the first frame on a session. The credential is resolved
//! to a user id and profile *before* the registry critical section is
//! entered; only the color assignment and presence registration run under
//! the lock.

use super::context::{Context, Identity};
use super::registry::Handler;
use crate::error::{HandlerError, HandlerResult};
use crate::metrics;
use crate::security::token;
use crate::state::UserPresence;
use async_trait::async_trait;
use canvas_proto::{ClientFrame, ServerFrame};
use tracing::{debug, info};

pub struct AuthHandler;

#[async_trait]
impl Handler for AuthHandler {
    async fn handle(&self, ctx: &mut Context<'_>, frame: &ClientFrame) -> HandlerResult {
        let ClientFrame::Auth { token } = frame else {
            return Err(HandlerError::Internal("frame routed to wrong handler".into()));
        };

        // A session authenticates exactly once
        if ctx.state.is_authenticated() {
            debug!(session = %ctx.session_id, "Duplicate auth frame ignored");
            return Ok(());
        }

        let user_id = token::verify(token, &ctx.hub.token_secret).map_err(|e| {
            metrics::AUTH_FAILURES.inc();
            HandlerError::AuthFailed(e.to_string())
        })?;

        let record = ctx
            .hub
            .db
            .users()
            .fetch(&user_id)
            .await
            .map_err(|e| HandlerError::Internal(e.to_string()))?
            .ok_or_else(|| {
                metrics::AUTH_FAILURES.inc();
                HandlerError::AuthFailed(format!("unknown user {user_id}"))
            })?;

        // One live session per user: tear down any older one first, through
        // the full disconnect path so its space sees the leave.
        if let Some(old_session) = ctx.hub.session_for_user(&record.id) {
            info!(user = %record.id, session = %old_session, "Replacing existing session");
            ctx.hub
                .disconnect_session(old_session, "replaced by a new session");
        }

        let color = {
            let mut registry = ctx.hub.registry.write();
            let color = ctx.hub.colors.assign(registry.colors_in_use());
            registry.register_user(UserPresence::new(&record, color.clone()));
            color
        };
        ctx.hub.bind_user(ctx.session_id, &record.id);

        ctx.state.set_identity(Identity {
            user_id: record.id.clone(),
            user_name: record.name.clone(),
        });

        info!(user = %record.id, session = %ctx.session_id, "Session authenticated");

        ctx.send(&ServerFrame::AuthSuccess {
            user_id: record.id,
            user_name: record.name,
            user_color: color,
        })
    }
}
