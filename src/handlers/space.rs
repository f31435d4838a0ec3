//! Space membership: join (with access check) and leave.

use super::context::Context;
use super::registry::Handler;
use crate::error::{HandlerError, HandlerResult};
use async_trait::async_trait;
use canvas_proto::ClientFrame;

/// The always-accessible shared space.
const PUBLIC_SPACE_ID: &str = "public";
const PUBLIC_SPACE_NAME: &str = "Public";

pub struct SpaceJoinHandler;

#[async_trait]
impl Handler for SpaceJoinHandler {
    async fn handle(&self, ctx: &mut Context<'_>, frame: &ClientFrame) -> HandlerResult {
        let ClientFrame::SpaceJoin { space_id } = frame else {
            return Err(HandlerError::Internal("frame routed to wrong handler".into()));
        };
        let user_id = ctx.state.identity()?.user_id.clone();

        // Access check runs before the critical section; the registry lock
        // is never held across a database lookup.
        let (space_name, is_public) = if space_id == PUBLIC_SPACE_ID {
            (PUBLIC_SPACE_NAME.to_string(), true)
        } else {
            let space = ctx
                .hub
                .db
                .spaces()
                .fetch(space_id)
                .await
                .map_err(|e| HandlerError::Internal(e.to_string()))?
                .ok_or_else(|| HandlerError::SpaceNotFound(space_id.clone()))?;

            let granted = space.is_public
                || space.owner_id == user_id
                || ctx
                    .hub
                    .db
                    .spaces()
                    .is_member(space_id, &user_id)
                    .await
                    .map_err(|e| HandlerError::Internal(e.to_string()))?;
            if !granted {
                return Err(HandlerError::AccessDenied(space_id.clone()));
            }
            (space.name, space.is_public)
        };

        let timestamp = chrono::Utc::now().timestamp_millis();
        let emits = {
            let mut registry = ctx.hub.registry.write();
            registry.join_space(&user_id, space_id, &space_name, is_public, timestamp)
        };
        ctx.hub.deliver(emits);
        Ok(())
    }
}

pub struct SpaceLeaveHandler;

#[async_trait]
impl Handler for SpaceLeaveHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _frame: &ClientFrame) -> HandlerResult {
        let user_id = ctx.state.identity()?.user_id.clone();

        // Leaving while not in a space is a silent no-op.
        let emits = {
            let mut registry = ctx.hub.registry.write();
            registry.leave_space(&user_id)
        };
        ctx.hub.deliver(emits);
        Ok(())
    }
}
