//! Mutation event bridge.
//!
//! Card and connection mutations are persisted by the application side, not
//! the hub; here they are only re-broadcast to the rest of the sender's
//! space with the originator attached. Payload content is not validated.

use super::context::Context;
use super::registry::Handler;
use crate::error::HandlerResult;
use async_trait::async_trait;
use canvas_proto::{ClientFrame, ServerFrame};

pub struct EventRelayHandler;

#[async_trait]
impl Handler for EventRelayHandler {
    async fn handle(&self, ctx: &mut Context<'_>, frame: &ClientFrame) -> HandlerResult {
        let user_id = ctx.state.identity()?.user_id.clone();

        // A mutation announced outside any space has no audience.
        let Some((space_id, user_name)) = ({
            let registry = ctx.hub.registry.read();
            registry.broadcast_origin(&user_id)
        }) else {
            return Ok(());
        };

        let relayed = match frame {
            ClientFrame::CardCreated { card } => ServerFrame::CardCreated {
                card: card.clone(),
                user_id: user_id.clone(),
                user_name,
            },
            ClientFrame::CardUpdated { card } => ServerFrame::CardUpdated {
                card: card.clone(),
                user_id: user_id.clone(),
                user_name,
            },
            ClientFrame::CardDeleted { card_id } => ServerFrame::CardDeleted {
                card_id: card_id.clone(),
                user_id: user_id.clone(),
                user_name,
            },
            ClientFrame::ConnectionCreated { connection } => ServerFrame::ConnectionCreated {
                connection: connection.clone(),
                user_id: user_id.clone(),
                user_name,
            },
            ClientFrame::ConnectionDeleted { connection_id } => ServerFrame::ConnectionDeleted {
                connection_id: connection_id.clone(),
                user_id: user_id.clone(),
                user_name,
            },
            _ => return Ok(()),
        };

        ctx.hub
            .broadcast_to_space(&space_id, &relayed, Some(&user_id));
        Ok(())
    }
}
