//! Optimistic content-change relay and the request-sync backstop.
//!
//! Changes are relayed to the other room members first and persisted
//! asynchronously through the debouncer, so editing latency never waits on
//! the store. Divergence detection is the client's job: it compares the
//! relayed version against its own and falls back to `request-sync`.

use tracing::{debug, warn};

use crate::collab::{now_millis, CollabHub, SessionId};
use crate::models::{
    ContentChangeMessage, ContentChangedMessage, RequestSyncMessage, ServerMessage,
    SyncResponseMessage, UserView,
};

impl CollabHub {
    pub async fn content_change(&self, session_id: SessionId, msg: ContentChangeMessage) {
        // Membership gate: the session must occupy the room it claims to
        // edit. Edit capability is advisory (sent at join time as canEdit);
        // clients enforce it in their editors.
        let user = {
            let reg = self.inner().registry.lock().await;
            let Some(handle) = reg.session(session_id) else {
                return;
            };
            if handle.current_note.as_deref() != Some(msg.document_id.as_str()) {
                let user_id = handle.user.id.clone();
                drop(reg);
                warn!(
                    "Rejected edit from user {} outside document {}",
                    user_id, msg.document_id
                );
                self.send_error(session_id, "Not connected to this document")
                    .await;
                return;
            }
            handle.user.clone()
        };

        let note = match self.inner().notes.find_by_id(&msg.document_id).await {
            Ok(Some(note)) => note,
            Ok(None) => {
                self.send_error(session_id, "Document not found").await;
                return;
            }
            Err(e) => {
                warn!("Store error on edit of {}: {}", msg.document_id, e);
                self.send_error(session_id, "Failed to apply change").await;
                return;
            }
        };

        let editor_id = user.id.clone();
        let relay = ServerMessage::ContentChanged(ContentChangedMessage {
            user_id: user.id.clone(),
            user,
            document_id: msg.document_id.clone(),
            operation: msg.operation,
            content: msg.content.clone(),
            position: msg.position,
            length: msg.length,
            timestamp: msg.timestamp.unwrap_or_else(now_millis),
            version: note.version,
        });

        {
            let reg = self.inner().registry.lock().await;
            reg.broadcast_room(&msg.document_id, &relay, Some(session_id));
        }

        // Persist after the relay; the debouncer coalesces rapid edits.
        self.schedule_save(&msg.document_id, msg.content, editor_id);
    }

    /// Authoritative snapshot on demand. `needs_sync` tells the client
    /// whether its reported version already matches the store.
    pub async fn request_sync(&self, session_id: SessionId, msg: RequestSyncMessage) {
        {
            let reg = self.inner().registry.lock().await;
            let Some(handle) = reg.session(session_id) else {
                return;
            };
            if handle.current_note.as_deref() != Some(msg.document_id.as_str()) {
                drop(reg);
                self.send_error(session_id, "Not connected to this document")
                    .await;
                return;
            }
        }

        let note = match self.inner().notes.find_by_id(&msg.document_id).await {
            Ok(Some(note)) => note,
            Ok(None) => {
                self.send_error(session_id, "Document not found").await;
                return;
            }
            Err(e) => {
                warn!("Store error on sync of {}: {}", msg.document_id, e);
                self.send_error(session_id, "Failed to sync document").await;
                return;
            }
        };

        let last_edited_by = match &note.last_edited_by {
            Some(editor_id) => match self.inner().users.find_by_id(editor_id).await {
                Ok(record) => record.as_ref().map(UserView::from),
                Err(e) => {
                    debug!("Editor lookup failed for {}: {}", editor_id, e);
                    None
                }
            },
            None => None,
        };

        let needs_sync = msg.client_version.map_or(true, |v| v != note.version);
        debug!(
            "Sync response for {}: version {} (needs_sync: {})",
            msg.document_id, note.version, needs_sync
        );

        let reg = self.inner().registry.lock().await;
        reg.send_to(
            session_id,
            ServerMessage::SyncResponse(SyncResponseMessage {
                document_id: msg.document_id,
                content: note.content,
                version: note.version,
                last_edited_by,
                updated_at: note.updated_at,
                needs_sync,
            }),
        );
    }
}
