//! Frame handlers and dispatch.
//!
//! One handler per inbound frame family, dispatched by the wire `type`
//! discriminator through the [`Registry`]. Handlers return `()` on success:
//! the protocol is request/event, so most frames have no direct reply and
//! failures surface as an `error` frame on the originating session only.

mod auth;
mod card;
mod context;
mod cursor;
mod events;
mod registry;
mod space;

pub use context::{Context, SessionState};
pub use registry::{Handler, Registry};
