//! Debounced persistence.
//!
//! Each document has at most one pending save; every new edit replaces it
//! with the latest full content, so a burst of keystrokes produces exactly
//! one durable write after the window elapses. A failed save is reported to
//! the room and the content stays dirty until the next edit re-arms the
//! timer.

use tracing::{debug, error, info, warn};

use crate::collab::{now_millis, CollabHub, HubInner, TimerKind};
use crate::models::{AutoSavedMessage, SaveErrorMessage, ServerMessage};

impl CollabHub {
    /// Arm (or re-arm) the save timer for a document with the latest
    /// content snapshot.
    pub(crate) fn schedule_save(&self, document_id: &str, content: String, editor_id: String) {
        let inner = self.inner().clone();
        let doc = document_id.to_string();
        self.inner().timers.schedule(
            document_id,
            TimerKind::Save,
            self.inner().settings.save_debounce,
            async move {
                inner.flush_save(&doc, &content, &editor_id).await;
            },
        );
    }
}

impl HubInner {
    pub(crate) async fn flush_save(&self, document_id: &str, content: &str, editor_id: &str) {
        let current = match self.notes.find_by_id(document_id).await {
            Ok(Some(note)) => note,
            Ok(None) => {
                warn!("Skipping save: document {} no longer exists", document_id);
                return;
            }
            Err(e) => {
                error!("Save lookup failed for {}: {}", document_id, e);
                self.report_save_error(document_id).await;
                return;
            }
        };

        if current.content == content {
            debug!("Skipping save for {}: content unchanged", document_id);
            return;
        }

        match self.notes.save_content(document_id, content, editor_id).await {
            Ok(saved) => {
                info!(
                    "Auto-saved document {} at version {}",
                    document_id, saved.version
                );
                let reg = self.registry.lock().await;
                reg.broadcast_room(
                    document_id,
                    &ServerMessage::AutoSaved(AutoSavedMessage {
                        document_id: document_id.to_string(),
                        version: saved.version,
                        timestamp: now_millis(),
                    }),
                    None,
                );
            }
            Err(e) => {
                error!("Auto-save failed for {}: {}", document_id, e);
                self.report_save_error(document_id).await;
            }
        }
    }

    async fn report_save_error(&self, document_id: &str) {
        let reg = self.registry.lock().await;
        reg.broadcast_room(
            document_id,
            &ServerMessage::SaveError(SaveErrorMessage {
                document_id: document_id.to_string(),
                error: "Failed to auto-save changes".to_string(),
                timestamp: now_millis(),
            }),
            None,
        );
    }
}
