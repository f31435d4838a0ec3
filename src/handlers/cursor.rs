//! Cursor movement relay.
//!
//! The highest-volume frame on the wire. No per-frame info logging, no
//! span, one short write-lock acquisition, one broadcast excluding the
//! sender.

use super::context::Context;
use super::registry::Handler;
use crate::error::HandlerResult;
use async_trait::async_trait;
use canvas_proto::ClientFrame;

pub struct CursorMoveHandler;

#[async_trait]
impl Handler for CursorMoveHandler {
    async fn handle(&self, ctx: &mut Context<'_>, frame: &ClientFrame) -> HandlerResult {
        let ClientFrame::CursorMove { x, y } = frame else {
            return Ok(());
        };
        let user_id = ctx.state.identity()?.user_id.clone();

        let emit = {
            let mut registry = ctx.hub.registry.write();
            registry.update_cursor(&user_id, *x, *y)
        };
        if let Some(emit) = emit {
            ctx.hub.deliver(vec![emit]);
        }
        Ok(())
    }
}
