//! In-memory presence entry for one active user.

use crate::db::UserRecord;
use canvas_proto::{CursorPos, PeerInfo};
use chrono::{DateTime, Utc};

/// Presence of one authenticated user. Created on auth, destroyed when the
/// user's session closes; never persisted.
#[derive(Debug, Clone)]
pub struct UserPresence {
    pub id: String,
    pub name: String,
    #[allow(dead_code)] // part of the presence record, not broadcast
    pub email: String,
    pub picture: Option<String>,
    /// Display color, assigned once per session.
    pub color: String,
    /// Last known cursor position; `None` until the first move.
    pub cursor: Option<CursorPos>,
    /// Last time any frame arrived from this user.
    pub last_active: DateTime<Utc>,
}

impl UserPresence {
    /// Build presence from a stored profile and an assigned color.
    pub fn new(record: &UserRecord, color: String) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
            picture: record.picture.clone(),
            color,
            cursor: None,
            last_active: Utc::now(),
        }
    }

    /// Refresh the activity timestamp.
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// The `users:list` entry for this user.
    pub fn peer_info(&self) -> PeerInfo {
        PeerInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
            picture: self.picture.clone(),
            cursor: self.cursor,
        }
    }
}
