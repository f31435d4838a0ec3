//! Frame definitions for the hub protocol.
//!
//! The protocol is request/event rather than request/response: most server
//! frames are unsolicited broadcasts and most client frames have no direct
//! reply. Field names follow the JavaScript client conventions (`spaceId`,
//! `cardId`, ...), hence the per-variant `camelCase` renames.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A cursor position on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorPos {
    /// Canvas x coordinate.
    pub x: f64,
    /// Canvas y coordinate.
    pub y: f64,
}

/// One entry of a `users:list` frame: a peer currently in the space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerInfo {
    /// Stable user id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Assigned display color (`#rrggbb`).
    pub color: String,
    /// Avatar url, if the user has one.
    pub picture: Option<String>,
    /// Last known cursor position; `null` before the first move.
    pub cursor: Option<CursorPos>,
}

/// Frames a client may send to the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// Authenticate the session. Must be the first frame.
    #[serde(rename = "auth")]
    Auth {
        /// Signed bearer credential.
        token: String,
    },
    /// Join a space, or switch from the current one.
    #[serde(rename = "space:join", rename_all = "camelCase")]
    SpaceJoin {
        /// Target space id; `"public"` is always accessible.
        space_id: String,
    },
    /// Leave the current space.
    #[serde(rename = "space:leave")]
    SpaceLeave,
    /// Update the sender's cursor position.
    #[serde(rename = "cursor:move")]
    CursorMove {
        /// Canvas x coordinate.
        x: f64,
        /// Canvas y coordinate.
        y: f64,
    },
    /// Acquire an exclusive lock on a card.
    #[serde(rename = "card:lock", rename_all = "camelCase")]
    CardLock {
        /// Card to lock.
        card_id: String,
    },
    /// Release a lock held by the sender.
    #[serde(rename = "card:unlock", rename_all = "camelCase")]
    CardUnlock {
        /// Card to unlock.
        card_id: String,
    },
    /// Select a card (implies locking it).
    #[serde(rename = "card:select", rename_all = "camelCase")]
    CardSelect {
        /// Card to select.
        card_id: String,
    },
    /// Deselect a card (implies unlocking it if held).
    #[serde(rename = "card:deselect", rename_all = "camelCase")]
    CardDeselect {
        /// Card to deselect.
        card_id: String,
    },
    /// Announce a created card. The payload is relayed untouched.
    #[serde(rename = "card:created")]
    CardCreated {
        /// Opaque card payload.
        card: Value,
    },
    /// Announce an updated card. The payload is relayed untouched.
    #[serde(rename = "card:updated")]
    CardUpdated {
        /// Opaque card payload.
        card: Value,
    },
    /// Announce a deleted card.
    #[serde(rename = "card:deleted", rename_all = "camelCase")]
    CardDeleted {
        /// Deleted card id.
        card_id: String,
    },
    /// Announce a created connection between cards.
    #[serde(rename = "connection:created")]
    ConnectionCreated {
        /// Opaque connection payload.
        connection: Value,
    },
    /// Announce a deleted connection.
    #[serde(rename = "connection:deleted", rename_all = "camelCase")]
    ConnectionDeleted {
        /// Deleted connection id.
        connection_id: String,
    },
}

impl ClientFrame {
    /// The wire `type` discriminator of this frame.
    pub fn frame_type(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::SpaceJoin { .. } => "space:join",
            Self::SpaceLeave => "space:leave",
            Self::CursorMove { .. } => "cursor:move",
            Self::CardLock { .. } => "card:lock",
            Self::CardUnlock { .. } => "card:unlock",
            Self::CardSelect { .. } => "card:select",
            Self::CardDeselect { .. } => "card:deselect",
            Self::CardCreated { .. } => "card:created",
            Self::CardUpdated { .. } => "card:updated",
            Self::CardDeleted { .. } => "card:deleted",
            Self::ConnectionCreated { .. } => "connection:created",
            Self::ConnectionDeleted { .. } => "connection:deleted",
        }
    }
}

/// Frames the hub may send to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    /// Authentication succeeded.
    #[serde(rename = "auth:success", rename_all = "camelCase")]
    AuthSuccess {
        /// Authenticated user id.
        user_id: String,
        /// Display name.
        user_name: String,
        /// Assigned display color.
        user_color: String,
    },
    /// An operation failed; delivered only to the originating session.
    #[serde(rename = "error")]
    Error {
        /// Human-readable failure description.
        message: String,
    },
    /// Join confirmation, sent to the joining session only.
    #[serde(rename = "space:joined", rename_all = "camelCase")]
    SpaceJoined {
        /// Joined space id.
        space_id: String,
        /// Space display name.
        name: String,
        /// Whether the space is publicly accessible.
        is_public: bool,
    },
    /// Snapshot of everyone currently in the space, sent to the joiner.
    #[serde(rename = "users:list")]
    UsersList {
        /// Current members, joiner included.
        users: Vec<PeerInfo>,
    },
    /// A peer joined the space.
    #[serde(rename = "user:join", rename_all = "camelCase")]
    UserJoin {
        /// Joining user id.
        user_id: String,
        /// Joining user display name.
        user_name: String,
        /// Joining user display color.
        user_color: String,
        /// Join time, milliseconds since the Unix epoch.
        timestamp: i64,
    },
    /// A peer left the space.
    #[serde(rename = "user:leave", rename_all = "camelCase")]
    UserLeave {
        /// Leaving user id.
        user_id: String,
        /// Leaving user display name.
        user_name: String,
    },
    /// A peer moved their cursor.
    #[serde(rename = "cursor:move", rename_all = "camelCase")]
    CursorMove {
        /// Moving user id.
        user_id: String,
        /// Moving user display name.
        user_name: String,
        /// Moving user display color.
        user_color: String,
        /// Canvas x coordinate.
        x: f64,
        /// Canvas y coordinate.
        y: f64,
    },
    /// A card was locked.
    #[serde(rename = "card:locked", rename_all = "camelCase")]
    CardLocked {
        /// Locked card id.
        card_id: String,
        /// Lock owner id.
        user_id: String,
        /// Lock owner display name.
        user_name: String,
        /// Lock owner display color.
        user_color: String,
    },
    /// A card lock was released.
    #[serde(rename = "card:unlocked", rename_all = "camelCase")]
    CardUnlocked {
        /// Unlocked card id.
        card_id: String,
    },
    /// A card was selected.
    #[serde(rename = "card:selected", rename_all = "camelCase")]
    CardSelected {
        /// Selected card id.
        card_id: String,
        /// Selecting user id.
        user_id: String,
        /// Selecting user display name.
        user_name: String,
        /// Selecting user display color.
        user_color: String,
    },
    /// A card was deselected.
    #[serde(rename = "card:deselected", rename_all = "camelCase")]
    CardDeselected {
        /// Deselected card id.
        card_id: String,
        /// Deselecting user id.
        user_id: String,
        /// Deselecting user display name.
        user_name: String,
    },
    /// Relayed card creation, with the originator attached.
    #[serde(rename = "card:created", rename_all = "camelCase")]
    CardCreated {
        /// Opaque card payload, relayed untouched.
        card: Value,
        /// Originating user id.
        user_id: String,
        /// Originating user display name.
        user_name: String,
    },
    /// Relayed card update, with the originator attached.
    #[serde(rename = "card:updated", rename_all = "camelCase")]
    CardUpdated {
        /// Opaque card payload, relayed untouched.
        card: Value,
        /// Originating user id.
        user_id: String,
        /// Originating user display name.
        user_name: String,
    },
    /// Relayed card deletion, with the originator attached.
    #[serde(rename = "card:deleted", rename_all = "camelCase")]
    CardDeleted {
        /// Deleted card id.
        card_id: String,
        /// Originating user id.
        user_id: String,
        /// Originating user display name.
        user_name: String,
    },
    /// Relayed connection creation, with the originator attached.
    #[serde(rename = "connection:created", rename_all = "camelCase")]
    ConnectionCreated {
        /// Opaque connection payload, relayed untouched.
        connection: Value,
        /// Originating user id.
        user_id: String,
        /// Originating user display name.
        user_name: String,
    },
    /// Relayed connection deletion, with the originator attached.
    #[serde(rename = "connection:deleted", rename_all = "camelCase")]
    ConnectionDeleted {
        /// Deleted connection id.
        connection_id: String,
        /// Originating user id.
        user_id: String,
        /// Originating user display name.
        user_name: String,
    },
}

impl ServerFrame {
    /// The wire `type` discriminator of this frame.
    pub fn frame_type(&self) -> &'static str {
        match self {
            Self::AuthSuccess { .. } => "auth:success",
            Self::Error { .. } => "error",
            Self::SpaceJoined { .. } => "space:joined",
            Self::UsersList { .. } => "users:list",
            Self::UserJoin { .. } => "user:join",
            Self::UserLeave { .. } => "user:leave",
            Self::CursorMove { .. } => "cursor:move",
            Self::CardLocked { .. } => "card:locked",
            Self::CardUnlocked { .. } => "card:unlocked",
            Self::CardSelected { .. } => "card:selected",
            Self::CardDeselected { .. } => "card:deselected",
            Self::CardCreated { .. } => "card:created",
            Self::CardUpdated { .. } => "card:updated",
            Self::CardDeleted { .. } => "card:deleted",
            Self::ConnectionCreated { .. } => "connection:created",
            Self::ConnectionDeleted { .. } => "connection:deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_auth_frame() {
        let frame: ClientFrame = serde_json::from_str(r#"{"type":"auth","token":"abc"}"#).unwrap();
        assert_eq!(
            frame,
            ClientFrame::Auth {
                token: "abc".to_string()
            }
        );
    }

    #[test]
    fn parse_space_join_uses_camel_case() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"space:join","spaceId":"public"}"#).unwrap();
        assert_eq!(
            frame,
            ClientFrame::SpaceJoin {
                space_id: "public".to_string()
            }
        );
        // snake_case is not accepted on the wire
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"space:join","space_id":"x"}"#).is_err());
    }

    #[test]
    fn parse_unit_frame_without_payload() {
        let frame: ClientFrame = serde_json::from_str(r#"{"type":"space:leave"}"#).unwrap();
        assert_eq!(frame, ClientFrame::SpaceLeave);
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"bogus"}"#).is_err());
        assert!(serde_json::from_str::<ClientFrame>(r#"{"token":"no-type"}"#).is_err());
    }

    #[test]
    fn card_payload_is_opaque() {
        let frame: ClientFrame = serde_json::from_str(
            r#"{"type":"card:created","card":{"id":"c1","title":"hello","nested":{"deep":true}}}"#,
        )
        .unwrap();
        let ClientFrame::CardCreated { card } = frame else {
            panic!("wrong variant");
        };
        assert_eq!(card["nested"]["deep"], json!(true));
    }

    #[test]
    fn serialize_card_locked_shape() {
        let frame = ServerFrame::CardLocked {
            card_id: "c1".to_string(),
            user_id: "u1".to_string(),
            user_name: "Ana".to_string(),
            user_color: "#FF6B6B".to_string(),
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "card:locked",
                "cardId": "c1",
                "userId": "u1",
                "userName": "Ana",
                "userColor": "#FF6B6B",
            })
        );
    }

    #[test]
    fn users_list_cursor_is_null_before_first_move() {
        let frame = ServerFrame::UsersList {
            users: vec![PeerInfo {
                id: "u1".to_string(),
                name: "Ana".to_string(),
                color: "#FF6B6B".to_string(),
                picture: None,
                cursor: None,
            }],
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["users"][0]["cursor"], serde_json::Value::Null);
        assert_eq!(value["users"][0]["picture"], serde_json::Value::Null);
    }

    #[test]
    fn frame_type_matches_wire_tag() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"card:select","cardId":"c9"}"#).unwrap();
        assert_eq!(frame.frame_type(), "card:select");

        let out = ServerFrame::Error {
            message: "nope".to_string(),
        };
        let value = serde_json::to_value(&out).unwrap();
        assert_eq!(value["type"], out.frame_type());
    }
}
