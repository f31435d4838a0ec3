//! # canvas-proto
//!
//! Wire protocol for the canvasd collaboration hub.
//!
//! Every frame on the wire is a single JSON object with a `type`
//! discriminator, e.g. `{"type":"space:join","spaceId":"public"}`. This
//! crate models the full frame vocabulary as two sealed enums:
//!
//! - [`ClientFrame`]: everything a client may send to the hub
//! - [`ServerFrame`]: everything the hub may send to a client
//!
//! Parsing a frame with an unknown or missing `type` fails, which the
//! server surfaces as a malformed-frame error without closing the session.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod frames;

pub use frames::{ClientFrame, CursorPos, PeerInfo, ServerFrame};
