//! Card locking and selection.
//!
//! Thin wrappers: the actual state machine lives in the registry so the
//! coupled selection/lock transitions stay atomic under its lock. Handlers
//! only resolve the acting user, run the operation, and deliver the
//! resulting broadcasts.

use super::context::Context;
use super::registry::Handler;
use crate::error::{HandlerError, HandlerResult};
use async_trait::async_trait;
use canvas_proto::ClientFrame;

pub struct CardLockHandler;

#[async_trait]
impl Handler for CardLockHandler {
    async fn handle(&self, ctx: &mut Context<'_>, frame: &ClientFrame) -> HandlerResult {
        let ClientFrame::CardLock { card_id } = frame else {
            return Err(HandlerError::Internal("frame routed to wrong handler".into()));
        };
        let user_id = ctx.state.identity()?.user_id.clone();

        let emits = {
            let mut registry = ctx.hub.registry.write();
            registry.lock_card(&user_id, card_id)?
        };
        ctx.hub.deliver(emits);
        Ok(())
    }
}

pub struct CardUnlockHandler;

#[async_trait]
impl Handler for CardUnlockHandler {
    async fn handle(&self, ctx: &mut Context<'_>, frame: &ClientFrame) -> HandlerResult {
        let ClientFrame::CardUnlock { card_id } = frame else {
            return Err(HandlerError::Internal("frame routed to wrong handler".into()));
        };
        let user_id = ctx.state.identity()?.user_id.clone();

        // Unlocking a card held by someone else (or nobody) is silent.
        let emits = {
            let mut registry = ctx.hub.registry.write();
            registry.unlock_card(&user_id, card_id)
        };
        ctx.hub.deliver(emits);
        Ok(())
    }
}

pub struct CardSelectHandler;

#[async_trait]
impl Handler for CardSelectHandler {
    async fn handle(&self, ctx: &mut Context<'_>, frame: &ClientFrame) -> HandlerResult {
        let ClientFrame::CardSelect { card_id } = frame else {
            return Err(HandlerError::Internal("frame routed to wrong handler".into()));
        };
        let user_id = ctx.state.identity()?.user_id.clone();

        // Switching selection deselects and unlocks the previous card in
        // the same critical section, so peers never observe a state where
        // one user holds two selections.
        let emits = {
            let mut registry = ctx.hub.registry.write();
            registry.select_card(&user_id, card_id)?
        };
        ctx.hub.deliver(emits);
        Ok(())
    }
}

pub struct CardDeselectHandler;

#[async_trait]
impl Handler for CardDeselectHandler {
    async fn handle(&self, ctx: &mut Context<'_>, frame: &ClientFrame) -> HandlerResult {
        let ClientFrame::CardDeselect { card_id } = frame else {
            return Err(HandlerError::Internal("frame routed to wrong handler".into()));
        };
        let user_id = ctx.state.identity()?.user_id.clone();

        let emits = {
            let mut registry = ctx.hub.registry.write();
            registry.deselect_card(&user_id, card_id)
        };
        ctx.hub.deliver(emits);
        Ok(())
    }
}
