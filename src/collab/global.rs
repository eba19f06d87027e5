//! Global public-document lifecycle channel.
//!
//! Every session subscribes at connect time; clients may opt out and back
//! in. Announcements arrive over the internal REST surface and fan out to
//! all subscribed sessions, with the `is_public` transition deciding which
//! notice (if any) goes out.

use tracing::info;

use crate::collab::{now_millis, CollabHub, SessionId};
use crate::models::{
    FieldChanges, GlobalAckMessage, NoteRecord, PublicDocCreatedMessage, PublicDocDeletedMessage,
    PublicDocPrivatizedMessage, PublicDocUpdatedMessage, ServerMessage, UserView,
};

impl CollabHub {
    pub async fn join_global(&self, session_id: SessionId) {
        let mut reg = self.inner().registry.lock().await;
        let Some(handle) = reg.session_mut(session_id) else {
            return;
        };
        handle.in_global = true;
        reg.send_to(
            session_id,
            ServerMessage::GlobalJoined(GlobalAckMessage {
                message: "Subscribed to global updates".to_string(),
                timestamp: now_millis(),
            }),
        );
    }

    pub async fn leave_global(&self, session_id: SessionId) {
        let mut reg = self.inner().registry.lock().await;
        let Some(handle) = reg.session_mut(session_id) else {
            return;
        };
        handle.in_global = false;
        reg.send_to(
            session_id,
            ServerMessage::GlobalLeft(GlobalAckMessage {
                message: "Unsubscribed from global updates".to_string(),
                timestamp: now_millis(),
            }),
        );
    }

    /// Deliver an arbitrary event to every member of a document room.
    /// Entry point for external mutation handlers that need to notify a
    /// specific room rather than the global audience.
    pub async fn emit_to_document_room(&self, document_id: &str, message: ServerMessage) {
        let reg = self.inner().registry.lock().await;
        reg.broadcast_room(document_id, &message, None);
    }

    /// A document was created. Only public documents are announced.
    pub async fn announce_created(&self, document: NoteRecord, creator: UserView) {
        if !document.is_public {
            return;
        }
        info!("Announcing public document created: {}", document.id);
        let reg = self.inner().registry.lock().await;
        reg.broadcast_global(&ServerMessage::PublicDocCreated(PublicDocCreatedMessage {
            document,
            creator,
            timestamp: now_millis(),
        }));
    }

    /// A document was updated. Announced when it is public now or just
    /// became public; a public-to-private flip instead emits a privatized
    /// notice so listeners can drop it from their views.
    pub async fn announce_updated(
        &self,
        document: NoteRecord,
        editor: UserView,
        changes: FieldChanges,
    ) {
        if changes.became_private() {
            info!("Announcing document privatized: {}", document.id);
            let reg = self.inner().registry.lock().await;
            reg.broadcast_global(&ServerMessage::PublicDocPrivatized(
                PublicDocPrivatizedMessage {
                    document_id: document.id,
                    title: document.title,
                    timestamp: now_millis(),
                },
            ));
            return;
        }
        if !(document.is_public || changes.became_public()) {
            return;
        }
        info!("Announcing public document updated: {}", document.id);
        let reg = self.inner().registry.lock().await;
        reg.broadcast_global(&ServerMessage::PublicDocUpdated(PublicDocUpdatedMessage {
            document,
            editor,
            changes,
            timestamp: now_millis(),
        }));
    }

    /// A document was deleted. Only public documents are announced.
    pub async fn announce_deleted(&self, document: NoteRecord, deleter: UserView) {
        if !document.is_public {
            return;
        }
        info!("Announcing public document deleted: {}", document.id);
        let reg = self.inner().registry.lock().await;
        reg.broadcast_global(&ServerMessage::PublicDocDeleted(PublicDocDeletedMessage {
            document_id: document.id,
            title: document.title,
            deleter,
            timestamp: now_millis(),
        }));
    }
}
