//! The presence registry: the hub's single authoritative critical section.
//!
//! All shared presence state lives here: active users, space membership
//! (with an inverted index for the broadcast hot path), card locks, and
//! per-user selections. Selection and locking are tightly coupled
//! (`selected[U] = C` implies `lock[C] = U`), so both maps sit behind the
//! same lock and every multi-step sequence (deselect-old, select-new,
//! relock) runs inside one call.
//!
//! Operations never send anything themselves. They mutate state and return
//! an ordered list of [`Emit`]s; the caller delivers those after releasing
//! the lock. This keeps socket writes and database lookups out of the
//! critical section, and makes the state machine testable without a single
//! socket.
//!
//! Invariants maintained by every operation:
//! 1. `selected[U] = C` implies `lock[C] = U` (the converse does not hold)
//! 2. a user belongs to at most one space
//! 3. removing a user clears every map entry and every lock they own

use crate::error::HandlerError;
use crate::state::user::UserPresence;
use canvas_proto::{CursorPos, PeerInfo, ServerFrame};
use std::collections::{HashMap, HashSet};

/// Where a frame produced by a registry operation must be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// One specific session.
    User(String),
    /// Every session currently in a space, minus an optional originator.
    Space {
        space_id: String,
        exclude: Option<String>,
    },
}

/// One frame plus its delivery scope, in emission order.
#[derive(Debug, Clone)]
pub struct Emit {
    pub scope: Scope,
    pub frame: ServerFrame,
}

impl Emit {
    fn to_user(user_id: &str, frame: ServerFrame) -> Self {
        Self {
            scope: Scope::User(user_id.to_string()),
            frame,
        }
    }

    fn to_space(space_id: &str, exclude: Option<&str>, frame: ServerFrame) -> Self {
        Self {
            scope: Scope::Space {
                space_id: space_id.to_string(),
                exclude: exclude.map(str::to_string),
            },
            frame,
        }
    }
}

/// Authoritative presence maps. See the module docs for the discipline.
#[derive(Default)]
pub struct Registry {
    /// Active users by id.
    users: HashMap<String, UserPresence>,
    /// userId -> current spaceId. A user is in at most one space.
    memberships: HashMap<String, String>,
    /// spaceId -> members. Inverted index so cursor fan-out avoids a scan.
    space_index: HashMap<String, HashSet<String>>,
    /// cardId -> lock owner. Global across spaces.
    locks: HashMap<String, String>,
    /// userId -> selected cardId (at most one).
    selections: HashMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an authenticated user's presence.
    pub fn register_user(&mut self, presence: UserPresence) {
        self.users.insert(presence.id.clone(), presence);
    }

    /// Colors currently held by active users.
    pub fn colors_in_use(&self) -> impl Iterator<Item = &str> {
        self.users.values().map(|u| u.color.as_str())
    }

    /// The space a user is currently in, if any.
    #[allow(dead_code)] // exercised by tests
    pub fn current_space(&self, user_id: &str) -> Option<&str> {
        self.memberships.get(user_id).map(String::as_str)
    }

    /// Members of a space, sorted for deterministic delivery.
    pub fn members_of(&self, space_id: &str) -> Vec<String> {
        let mut members: Vec<String> = self
            .space_index
            .get(space_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    /// The current space and display name of a user, for event relaying.
    pub fn broadcast_origin(&self, user_id: &str) -> Option<(String, String)> {
        let space = self.memberships.get(user_id)?;
        let user = self.users.get(user_id)?;
        Some((space.clone(), user.name.clone()))
    }

    /// Join `space_id`, leaving any current space first.
    ///
    /// Rejoining the current space is idempotent: the confirmation and peer
    /// list are re-sent but no `user:join` is broadcast.
    pub fn join_space(
        &mut self,
        user_id: &str,
        space_id: &str,
        space_name: &str,
        is_public: bool,
        timestamp: i64,
    ) -> Vec<Emit> {
        if !self.users.contains_key(user_id) {
            return Vec::new();
        }

        let joined = ServerFrame::SpaceJoined {
            space_id: space_id.to_string(),
            name: space_name.to_string(),
            is_public,
        };

        let mut emits = Vec::new();
        let current = self.memberships.get(user_id).cloned();
        match current.as_deref() {
            Some(current) if current == space_id => {
                emits.push(Emit::to_user(user_id, joined));
                emits.push(Emit::to_user(user_id, self.users_list_frame(space_id)));
                return emits;
            }
            Some(_) => emits.extend(self.leave_space(user_id)),
            None => {}
        }

        self.memberships
            .insert(user_id.to_string(), space_id.to_string());
        self.space_index
            .entry(space_id.to_string())
            .or_default()
            .insert(user_id.to_string());

        let user = &self.users[user_id];
        let announce = ServerFrame::UserJoin {
            user_id: user_id.to_string(),
            user_name: user.name.clone(),
            user_color: user.color.clone(),
            timestamp,
        };

        emits.push(Emit::to_user(user_id, joined));
        emits.push(Emit::to_space(space_id, Some(user_id), announce));
        emits.push(Emit::to_user(user_id, self.users_list_frame(space_id)));
        emits
    }

    /// Leave the current space: release every owned lock (unlock broadcasts
    /// first), then announce the departure. No-op when not in a space.
    pub fn leave_space(&mut self, user_id: &str) -> Vec<Emit> {
        let Some(space_id) = self.memberships.remove(user_id) else {
            return Vec::new();
        };
        if let Some(members) = self.space_index.get_mut(&space_id) {
            members.remove(user_id);
            if members.is_empty() {
                self.space_index.remove(&space_id);
            }
        }

        // Selection is cleared silently; peers derive it from the unlocks.
        self.selections.remove(user_id);

        let mut owned: Vec<String> = self
            .locks
            .iter()
            .filter(|(_, owner)| owner.as_str() == user_id)
            .map(|(card, _)| card.clone())
            .collect();
        owned.sort();

        let mut emits = Vec::new();
        for card_id in owned {
            self.locks.remove(&card_id);
            emits.push(Emit::to_space(
                &space_id,
                None,
                ServerFrame::CardUnlocked { card_id },
            ));
        }

        let user_name = self
            .users
            .get(user_id)
            .map(|u| u.name.clone())
            .unwrap_or_default();
        emits.push(Emit::to_space(
            &space_id,
            None,
            ServerFrame::UserLeave {
                user_id: user_id.to_string(),
                user_name,
            },
        ));
        emits
    }

    /// Record a cursor move; returns the broadcast when the user is in a
    /// space. Deliberately minimal: this is the hot path.
    pub fn update_cursor(&mut self, user_id: &str, x: f64, y: f64) -> Option<Emit> {
        let user = self.users.get_mut(user_id)?;
        user.cursor = Some(CursorPos { x, y });
        user.touch();

        let space_id = self.memberships.get(user_id)?;
        let user = &self.users[user_id];
        Some(Emit::to_space(
            space_id,
            Some(user_id),
            ServerFrame::CursorMove {
                user_id: user_id.to_string(),
                user_name: user.name.clone(),
                user_color: user.color.clone(),
                x,
                y,
            },
        ))
    }

    /// Acquire an explicit lock. Fails when another user holds the card.
    pub fn lock_card(
        &mut self,
        user_id: &str,
        card_id: &str,
    ) -> Result<Vec<Emit>, HandlerError> {
        if !self.users.contains_key(user_id) {
            return Ok(Vec::new());
        }
        if let Some(owner) = self.locks.get(card_id)
            && owner != user_id
        {
            return Err(HandlerError::LockConflict(card_id.to_string()));
        }

        self.touch(user_id);
        self.locks
            .insert(card_id.to_string(), user_id.to_string());
        Ok(self.locked_emit(user_id, card_id).into_iter().collect())
    }

    /// Release an explicit lock. Silent when the card is not held by this
    /// user.
    pub fn unlock_card(&mut self, user_id: &str, card_id: &str) -> Vec<Emit> {
        if self.locks.get(card_id).map(String::as_str) != Some(user_id) {
            return Vec::new();
        }
        self.touch(user_id);
        self.locks.remove(card_id);
        self.unlocked_emit(user_id, card_id).into_iter().collect()
    }

    /// Select a card, implying a lock. Any previous selection is released
    /// first (`card:deselected`, then `card:unlocked` if the lock was
    /// held). Selecting a card locked by another user is refused.
    pub fn select_card(
        &mut self,
        user_id: &str,
        card_id: &str,
    ) -> Result<Vec<Emit>, HandlerError> {
        if !self.users.contains_key(user_id) {
            return Ok(Vec::new());
        }
        if let Some(owner) = self.locks.get(card_id)
            && owner != user_id
        {
            return Err(HandlerError::LockConflict(card_id.to_string()));
        }

        self.touch(user_id);
        let mut emits = Vec::new();

        if let Some(previous) = self.selections.get(user_id).cloned()
            && previous != card_id
        {
            self.selections.remove(user_id);
            emits.extend(self.deselected_emit(user_id, &previous));
            if self.locks.get(&previous).map(String::as_str) == Some(user_id) {
                self.locks.remove(&previous);
                emits.extend(self.unlocked_emit(user_id, &previous));
            }
        }

        self.selections
            .insert(user_id.to_string(), card_id.to_string());
        self.locks
            .insert(card_id.to_string(), user_id.to_string());

        emits.extend(self.selected_emit(user_id, card_id));
        emits.extend(self.locked_emit(user_id, card_id));
        Ok(emits)
    }

    /// Deselect a card: release the implied lock, then announce the
    /// deselection. Silent when this card is not the user's selection.
    pub fn deselect_card(&mut self, user_id: &str, card_id: &str) -> Vec<Emit> {
        if self.selections.get(user_id).map(String::as_str) != Some(card_id) {
            return Vec::new();
        }
        self.touch(user_id);
        self.selections.remove(user_id);

        let mut emits = Vec::new();
        if self.locks.get(card_id).map(String::as_str) == Some(user_id) {
            self.locks.remove(card_id);
            emits.extend(self.unlocked_emit(user_id, card_id));
        }
        emits.extend(self.deselected_emit(user_id, card_id));
        emits
    }

    /// Full cleanup on disconnect: the leave sequence, then removal from
    /// every map. After this returns, no map mentions the user.
    pub fn remove_user(&mut self, user_id: &str) -> Vec<Emit> {
        let emits = self.leave_space(user_id);
        // Locks acquired while not in any space have no audience but must
        // still be released.
        self.locks.retain(|_, owner| owner != user_id);
        self.selections.remove(user_id);
        self.users.remove(user_id);
        emits
    }

    /// Whether a user has registered presence.
    #[allow(dead_code)] // exercised by tests
    pub fn contains_user(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    /// Lock owner of a card, if any.
    #[allow(dead_code)] // exercised by tests
    pub fn lock_owner(&self, card_id: &str) -> Option<&str> {
        self.locks.get(card_id).map(String::as_str)
    }

    /// Card a user has selected, if any.
    #[allow(dead_code)] // exercised by tests
    pub fn selection_of(&self, user_id: &str) -> Option<&str> {
        self.selections.get(user_id).map(String::as_str)
    }

    fn touch(&mut self, user_id: &str) {
        if let Some(user) = self.users.get_mut(user_id) {
            user.touch();
        }
    }

    fn users_list_frame(&self, space_id: &str) -> ServerFrame {
        let mut peers: Vec<PeerInfo> = self
            .space_index
            .get(space_id)
            .into_iter()
            .flatten()
            .filter_map(|uid| self.users.get(uid))
            .map(UserPresence::peer_info)
            .collect();
        peers.sort_by(|a, b| a.id.cmp(&b.id));
        ServerFrame::UsersList { users: peers }
    }

    /// Broadcast to the user's current space; none when spaceless.
    fn space_emit(&self, user_id: &str, frame: ServerFrame) -> Option<Emit> {
        let space_id = self.memberships.get(user_id)?;
        Some(Emit::to_space(space_id, None, frame))
    }

    fn locked_emit(&self, user_id: &str, card_id: &str) -> Option<Emit> {
        let user = self.users.get(user_id)?;
        let frame = ServerFrame::CardLocked {
            card_id: card_id.to_string(),
            user_id: user_id.to_string(),
            user_name: user.name.clone(),
            user_color: user.color.clone(),
        };
        self.space_emit(user_id, frame)
    }

    fn unlocked_emit(&self, user_id: &str, card_id: &str) -> Option<Emit> {
        self.space_emit(
            user_id,
            ServerFrame::CardUnlocked {
                card_id: card_id.to_string(),
            },
        )
    }

    fn selected_emit(&self, user_id: &str, card_id: &str) -> Option<Emit> {
        let user = self.users.get(user_id)?;
        let frame = ServerFrame::CardSelected {
            card_id: card_id.to_string(),
            user_id: user_id.to_string(),
            user_name: user.name.clone(),
            user_color: user.color.clone(),
        };
        self.space_emit(user_id, frame)
    }

    fn deselected_emit(&self, user_id: &str, card_id: &str) -> Option<Emit> {
        let user = self.users.get(user_id)?;
        let frame = ServerFrame::CardDeselected {
            card_id: card_id.to_string(),
            user_id: user_id.to_string(),
            user_name: user.name.clone(),
        };
        self.space_emit(user_id, frame)
    }
}
