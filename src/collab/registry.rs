use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::models::{ServerMessage, UserView};

pub type SessionId = Uuid;

/// One connected, authenticated client: its immutable identity, its
/// outbound event queue, and the room it currently occupies (at most one).
pub struct SessionHandle {
    pub user: UserView,
    pub tx: UnboundedSender<ServerMessage>,
    pub current_note: Option<String>,
    pub in_global: bool,
}

/// A typing indicator with its expiry deadline. Entries past their deadline
/// are never returned by reads even before the removal timer fires.
pub struct TypingEntry {
    pub cursor_position: Option<usize>,
    pub expires_at: Instant,
}

#[derive(Default)]
pub struct Room {
    pub members: HashSet<SessionId>,
    pub typing: HashMap<String, TypingEntry>,
}

/// All per-instance collaboration state: sessions, rooms, presence and
/// typing. Owned by the hub and only mutated through it; never ambient
/// global state, so independent instances can coexist in tests.
#[derive(Default)]
pub struct RoomRegistry {
    sessions: HashMap<SessionId, SessionHandle>,
    rooms: HashMap<String, Room>,
}

impl RoomRegistry {
    pub fn add_session(&mut self, id: SessionId, handle: SessionHandle) {
        self.sessions.insert(id, handle);
    }

    pub fn remove_session(&mut self, id: SessionId) -> Option<SessionHandle> {
        self.sessions.remove(&id)
    }

    pub fn session(&self, id: SessionId) -> Option<&SessionHandle> {
        self.sessions.get(&id)
    }

    pub fn session_mut(&mut self, id: SessionId) -> Option<&mut SessionHandle> {
        self.sessions.get_mut(&id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Total room memberships across all documents.
    pub fn member_total(&self) -> usize {
        self.rooms.values().map(|r| r.members.len()).sum()
    }

    pub fn global_subscriber_count(&self) -> usize {
        self.sessions.values().filter(|h| h.in_global).count()
    }

    pub fn join_room(&mut self, document_id: &str, id: SessionId) {
        self.rooms
            .entry(document_id.to_string())
            .or_default()
            .members
            .insert(id);
    }

    /// Remove a session from a room, dropping its typing entry with it.
    /// Returns whether it was a member.
    pub fn leave_room(&mut self, document_id: &str, id: SessionId, user_id: &str) -> bool {
        let Some(room) = self.rooms.get_mut(document_id) else {
            return false;
        };
        let was_member = room.members.remove(&id);
        if was_member {
            room.typing.remove(user_id);
        }
        was_member
    }

    pub fn room_mut(&mut self, document_id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(document_id)
    }

    pub fn room_is_empty(&self, document_id: &str) -> bool {
        self.rooms
            .get(document_id)
            .map_or(true, |r| r.members.is_empty())
    }

    pub fn remove_room(&mut self, document_id: &str) -> Option<Room> {
        self.rooms.remove(document_id)
    }

    /// Display identities of the room's members, deduplicated by user id
    /// (one user may hold several sessions).
    pub fn active_users(&self, document_id: &str) -> Vec<UserView> {
        let Some(room) = self.rooms.get(document_id) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut users = Vec::new();
        for id in &room.members {
            if let Some(handle) = self.sessions.get(id) {
                if seen.insert(handle.user.id.clone()) {
                    users.push(handle.user.clone());
                }
            }
        }
        users
    }

    /// User ids with a live (non-expired) typing entry for the document.
    pub fn typing_user_ids(&self, document_id: &str) -> Vec<String> {
        let now = Instant::now();
        self.rooms
            .get(document_id)
            .map(|room| {
                room.typing
                    .iter()
                    .filter(|(_, entry)| entry.expires_at > now)
                    .map(|(user_id, _)| user_id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Queue a message for one session. A closed channel only means the
    /// connection is tearing down; the disconnect path cleans up.
    pub fn send_to(&self, id: SessionId, message: ServerMessage) {
        if let Some(handle) = self.sessions.get(&id) {
            let _ = handle.tx.send(message);
        }
    }

    pub fn broadcast_room(
        &self,
        document_id: &str,
        message: &ServerMessage,
        exclude: Option<SessionId>,
    ) {
        let Some(room) = self.rooms.get(document_id) else {
            return;
        };
        for id in &room.members {
            if Some(*id) == exclude {
                continue;
            }
            self.send_to(*id, message.clone());
        }
    }

    /// Broadcast to a room, skipping every session of one user. Used for
    /// typing expiry, where no originating session is at hand.
    pub fn broadcast_room_except_user(
        &self,
        document_id: &str,
        message: &ServerMessage,
        user_id: &str,
    ) {
        let Some(room) = self.rooms.get(document_id) else {
            return;
        };
        for id in &room.members {
            if let Some(handle) = self.sessions.get(id) {
                if handle.user.id != user_id {
                    let _ = handle.tx.send(message.clone());
                }
            }
        }
    }

    pub fn broadcast_global(&self, message: &ServerMessage) {
        for handle in self.sessions.values() {
            if handle.in_global {
                let _ = handle.tx.send(message.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn user(id: &str) -> UserView {
        UserView {
            id: id.to_string(),
            username: id.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            avatar: None,
        }
    }

    fn handle(id: &str) -> (SessionHandle, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            SessionHandle {
                user: user(id),
                tx,
                current_note: None,
                in_global: true,
            },
            rx,
        )
    }

    #[test]
    fn presence_matches_membership() {
        let mut reg = RoomRegistry::default();
        let (h1, _rx1) = handle("alice");
        let (h2, _rx2) = handle("bob");
        let s1 = Uuid::new_v4();
        let s2 = Uuid::new_v4();
        reg.add_session(s1, h1);
        reg.add_session(s2, h2);

        reg.join_room("doc", s1);
        reg.join_room("doc", s2);
        assert_eq!(reg.active_users("doc").len(), 2);

        assert!(reg.leave_room("doc", s1, "alice"));
        let remaining = reg.active_users("doc");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "bob");

        // leaving twice is a no-op
        assert!(!reg.leave_room("doc", s1, "alice"));
    }

    #[test]
    fn expired_typing_entries_are_never_read() {
        let mut reg = RoomRegistry::default();
        let (h1, _rx) = handle("alice");
        let s1 = Uuid::new_v4();
        reg.add_session(s1, h1);
        reg.join_room("doc", s1);

        let room = reg.room_mut("doc").unwrap();
        room.typing.insert(
            "alice".to_string(),
            TypingEntry {
                cursor_position: Some(3),
                expires_at: Instant::now() + Duration::from_secs(5),
            },
        );
        room.typing.insert(
            "bob".to_string(),
            TypingEntry {
                cursor_position: None,
                expires_at: Instant::now() - Duration::from_millis(1),
            },
        );

        assert_eq!(reg.typing_user_ids("doc"), vec!["alice".to_string()]);
    }
}
