//! The collaboration hub: session lifecycle, document rooms, presence and
//! typing, the sync relay, debounced persistence, and the global fan-out.
//!
//! All mutable state lives in the per-instance [`RoomRegistry`] behind one
//! async mutex; suspension points are only at store I/O and timers. Relay
//! ordering within a room follows the order the hub processed the events.

pub mod registry;
pub mod saver;
pub mod sync;
pub mod timers;

pub use registry::{RoomRegistry, SessionId, SessionHandle};
pub use timers::{TimerKind, TimerTable};

mod global;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{
    ConnectedMessage, CursorPositionMessage, DiagnosticsResponse, DocumentJoinedMessage,
    DocumentLeftMessage, ErrorMessage, ServerMessage, UserCursorPositionMessage,
    UserJoinedMessage, UserLeftMessage, UserTypingStartMessage, UserTypingStopMessage, UserView,
};
use crate::store::{NoteStore, UserStore};
use registry::TypingEntry;

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Tunable windows. Both are design constants with documented defaults:
/// typing indicators expire after 5 s without a refresh, edits coalesce
/// into one write 2 s after the last keystroke.
#[derive(Debug, Clone)]
pub struct HubSettings {
    pub save_debounce: Duration,
    pub typing_ttl: Duration,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            save_debounce: Duration::from_millis(2000),
            typing_ttl: Duration::from_millis(5000),
        }
    }
}

impl HubSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            save_debounce: Duration::from_millis(config.save_debounce_ms),
            typing_ttl: Duration::from_millis(config.typing_ttl_ms),
        }
    }
}

pub(crate) struct HubInner {
    pub(crate) settings: HubSettings,
    pub(crate) notes: Arc<dyn NoteStore>,
    pub(crate) users: Arc<dyn UserStore>,
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) timers: TimerTable,
}

/// Handle to one hub instance. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct CollabHub {
    inner: Arc<HubInner>,
}

impl CollabHub {
    pub fn new(notes: Arc<dyn NoteStore>, users: Arc<dyn UserStore>, settings: HubSettings) -> Self {
        Self {
            inner: Arc::new(HubInner {
                settings,
                notes,
                users,
                registry: Mutex::new(RoomRegistry::default()),
                timers: TimerTable::new(),
            }),
        }
    }

    pub fn user_store(&self) -> Arc<dyn UserStore> {
        self.inner.users.clone()
    }

    pub(crate) fn inner(&self) -> &Arc<HubInner> {
        &self.inner
    }

    /// Register an authenticated connection. The session joins the global
    /// channel by default and receives the connection greeting.
    pub async fn connect(&self, user: UserView, tx: UnboundedSender<ServerMessage>) -> SessionId {
        let session_id = Uuid::new_v4();
        let mut reg = self.inner.registry.lock().await;
        reg.add_session(
            session_id,
            SessionHandle {
                user: user.clone(),
                tx,
                current_note: None,
                in_global: true,
            },
        );
        reg.send_to(
            session_id,
            ServerMessage::Connected(ConnectedMessage {
                message: "Connected successfully".to_string(),
                user_id: user.id.clone(),
                timestamp: now_millis(),
            }),
        );
        info!(
            "User {} connected with session {} ({} total)",
            user.id,
            session_id,
            reg.session_count()
        );
        session_id
    }

    /// Tear down a session: equivalent to a leave of whatever room it
    /// occupies. Document-level save timers deliberately keep running.
    pub async fn disconnect(&self, session_id: SessionId) {
        let mut reg = self.inner.registry.lock().await;
        let Some(handle) = reg.remove_session(session_id) else {
            return;
        };
        if let Some(document_id) = &handle.current_note {
            self.depart_room_locked(&mut reg, session_id, &handle.user, document_id);
        }
        info!(
            "User {} disconnected session {} ({} remaining)",
            handle.user.id,
            session_id,
            reg.session_count()
        );
    }

    pub async fn join_document(&self, session_id: SessionId, document_id: &str) {
        if Uuid::parse_str(document_id).is_err() {
            warn!("Rejected join with malformed document id: {}", document_id);
            self.send_error(session_id, "Invalid document ID format").await;
            return;
        }

        // Load metadata before touching the registry; the registry lock is
        // never held across store I/O.
        let note = match self.inner.notes.find_by_id(document_id).await {
            Ok(Some(note)) => note,
            Ok(None) => {
                self.send_error(session_id, "Document not found").await;
                return;
            }
            Err(e) => {
                warn!("Store error while joining document {}: {}", document_id, e);
                self.send_error(session_id, "Failed to join document").await;
                return;
            }
        };

        let mut reg = self.inner.registry.lock().await;
        let Some(handle) = reg.session(session_id) else {
            return;
        };
        let user = handle.user.clone();

        if !note.can_read(&user.id) {
            warn!("Access denied: user {} on document {}", user.id, document_id);
            reg.send_to(
                session_id,
                ServerMessage::Error(ErrorMessage {
                    message: "Access denied".to_string(),
                }),
            );
            return;
        }

        // Exactly one active room per session: leave the previous one
        // implicitly.
        if let Some(previous) = reg.session(session_id).and_then(|h| h.current_note.clone()) {
            if previous != document_id {
                self.depart_room_locked(&mut reg, session_id, &user, &previous);
            }
        }

        reg.join_room(document_id, session_id);
        if let Some(handle) = reg.session_mut(session_id) {
            handle.current_note = Some(document_id.to_string());
        }

        let active_users = reg.active_users(document_id);
        let can_edit = note.can_edit(&user.id);
        reg.send_to(
            session_id,
            ServerMessage::DocumentJoined(DocumentJoinedMessage {
                document_id: document_id.to_string(),
                document: note,
                active_users,
                can_edit,
            }),
        );
        reg.broadcast_room(
            document_id,
            &ServerMessage::UserJoined(UserJoinedMessage {
                user: user.clone(),
                document_id: document_id.to_string(),
            }),
            Some(session_id),
        );
        info!("User {} joined document {}", user.id, document_id);
    }

    pub async fn leave_document(&self, session_id: SessionId, document_id: &str) {
        let mut reg = self.inner.registry.lock().await;
        let Some(handle) = reg.session(session_id) else {
            return;
        };
        // Silent no-op unless the session actually occupies this room.
        if handle.current_note.as_deref() != Some(document_id) {
            return;
        }
        let user = handle.user.clone();

        self.depart_room_locked(&mut reg, session_id, &user, document_id);
        if let Some(handle) = reg.session_mut(session_id) {
            handle.current_note = None;
        }
        reg.send_to(
            session_id,
            ServerMessage::DocumentLeft(DocumentLeftMessage {
                document_id: document_id.to_string(),
            }),
        );
        info!("User {} left document {}", user.id, document_id);
    }

    /// Record or refresh a typing indicator and (re)arm its expiry timer.
    /// Repeated starts for the same session just refresh the single timer.
    pub async fn typing_start(
        &self,
        session_id: SessionId,
        document_id: &str,
        cursor_position: Option<usize>,
    ) {
        let user = {
            let mut reg = self.inner.registry.lock().await;
            let Some(handle) = reg.session(session_id) else {
                return;
            };
            if handle.current_note.as_deref() != Some(document_id) {
                return;
            }
            let user = handle.user.clone();

            let expires_at = Instant::now() + self.inner.settings.typing_ttl;
            if let Some(room) = reg.room_mut(document_id) {
                room.typing.insert(
                    user.id.clone(),
                    TypingEntry {
                        cursor_position,
                        expires_at,
                    },
                );
            }
            reg.broadcast_room(
                document_id,
                &ServerMessage::UserTypingStart(UserTypingStartMessage {
                    user_id: user.id.clone(),
                    user: user.clone(),
                    document_id: document_id.to_string(),
                    cursor_position,
                }),
                Some(session_id),
            );
            user
        };

        let inner = self.inner.clone();
        let doc = document_id.to_string();
        let user_id = user.id.clone();
        self.inner.timers.schedule(
            document_id,
            TimerKind::Typing(user.id),
            self.inner.settings.typing_ttl,
            async move {
                inner.expire_typing(&doc, &user_id).await;
            },
        );
    }

    pub async fn typing_stop(&self, session_id: SessionId, document_id: &str) {
        let mut reg = self.inner.registry.lock().await;
        let Some(handle) = reg.session(session_id) else {
            return;
        };
        if handle.current_note.as_deref() != Some(document_id) {
            return;
        }
        let user_id = handle.user.id.clone();

        self.inner
            .timers
            .cancel(document_id, &TimerKind::Typing(user_id.clone()));
        if let Some(room) = reg.room_mut(document_id) {
            room.typing.remove(&user_id);
        }
        reg.broadcast_room(
            document_id,
            &ServerMessage::UserTypingStop(UserTypingStopMessage {
                user_id,
                document_id: document_id.to_string(),
            }),
            Some(session_id),
        );
    }

    /// Relay a cursor move to the other room members. Silent no-op unless
    /// the session occupies the room; nothing is recorded server-side.
    pub async fn cursor_position(&self, session_id: SessionId, msg: CursorPositionMessage) {
        let reg = self.inner.registry.lock().await;
        let Some(handle) = reg.session(session_id) else {
            return;
        };
        if handle.current_note.as_deref() != Some(msg.document_id.as_str()) {
            return;
        }
        let user = handle.user.clone();
        reg.broadcast_room(
            &msg.document_id,
            &ServerMessage::UserCursorPosition(UserCursorPositionMessage {
                user_id: user.id.clone(),
                user,
                document_id: msg.document_id.clone(),
                position: msg.position,
                selection: msg.selection,
            }),
            Some(session_id),
        );
    }

    pub async fn send_error(&self, session_id: SessionId, message: &str) {
        let reg = self.inner.registry.lock().await;
        reg.send_to(
            session_id,
            ServerMessage::Error(ErrorMessage {
                message: message.to_string(),
            }),
        );
    }

    /// Current presence set for a document, resolved to display identities.
    pub async fn active_users(&self, document_id: &str) -> Vec<UserView> {
        self.inner.registry.lock().await.active_users(document_id)
    }

    /// User ids with a live typing indicator for a document.
    pub async fn typing_user_ids(&self, document_id: &str) -> Vec<String> {
        self.inner.registry.lock().await.typing_user_ids(document_id)
    }

    /// Aggregate operational counters for the diagnostics surface.
    pub async fn stats(&self) -> DiagnosticsResponse {
        let reg = self.inner.registry.lock().await;
        DiagnosticsResponse {
            total_sessions: reg.session_count() as u32,
            active_documents: reg.room_count() as u32,
            total_active_users: reg.member_total() as u32,
            global_subscribers: reg.global_subscriber_count() as u32,
            pending_saves: self.inner.timers.pending_saves() as u32,
        }
    }

    /// Remove a session from a room and notify the remaining members.
    /// Callers own the session's current-note pointer.
    fn depart_room_locked(
        &self,
        reg: &mut RoomRegistry,
        session_id: SessionId,
        user: &UserView,
        document_id: &str,
    ) {
        if !reg.leave_room(document_id, session_id, &user.id) {
            return;
        }
        self.inner
            .timers
            .cancel(document_id, &TimerKind::Typing(user.id.clone()));
        reg.broadcast_room(
            document_id,
            &ServerMessage::UserLeft(UserLeftMessage {
                user_id: user.id.clone(),
                document_id: document_id.to_string(),
            }),
            Some(session_id),
        );
        if reg.room_is_empty(document_id) {
            if let Some(room) = reg.remove_room(document_id) {
                for user_id in room.typing.keys() {
                    self.inner
                        .timers
                        .cancel(document_id, &TimerKind::Typing(user_id.clone()));
                }
            }
            debug!("Room for document {} garbage collected", document_id);
        }
    }
}

impl HubInner {
    /// Typing expiry fired without an explicit stop: drop the entry and
    /// tell the room.
    pub(crate) async fn expire_typing(&self, document_id: &str, user_id: &str) {
        let reg = &mut *self.registry.lock().await;
        let removed = reg
            .room_mut(document_id)
            .map(|room| room.typing.remove(user_id).is_some())
            .unwrap_or(false);
        if removed {
            debug!("Typing indicator expired for user {} on {}", user_id, document_id);
            reg.broadcast_room_except_user(
                document_id,
                &ServerMessage::UserTypingStop(UserTypingStopMessage {
                    user_id: user_id.to_string(),
                    document_id: document_id.to_string(),
                }),
                user_id,
            );
        }
    }
}
