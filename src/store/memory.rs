use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{NoteRecord, UserRecord};
use crate::store::{NoteStore, StoreError, UserStore};

/// In-memory document store.
///
/// Counts writes and supports one-shot write-failure injection so the
/// debouncer's coalescing and error paths can be asserted in tests.
#[derive(Default)]
pub struct MemoryNoteStore {
    notes: Mutex<HashMap<String, NoteRecord>>,
    save_count: AtomicUsize,
    fail_next_save: AtomicBool,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, note: NoteRecord) {
        self.notes.lock().unwrap().insert(note.id.clone(), note);
    }

    pub fn get(&self, id: &str) -> Option<NoteRecord> {
        self.notes.lock().unwrap().get(id).cloned()
    }

    /// Number of successful writes since construction.
    pub fn save_calls(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Make the next `save_content` call fail with a backend error.
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<NoteRecord>, StoreError> {
        let notes = self.notes.lock().unwrap();
        Ok(notes.get(id).filter(|n| !n.is_deleted).cloned())
    }

    async fn save_content(
        &self,
        id: &str,
        content: &str,
        editor_id: &str,
    ) -> Result<NoteRecord, StoreError> {
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected write failure".to_string()));
        }

        let mut notes = self.notes.lock().unwrap();
        let note = notes
            .get_mut(id)
            .filter(|n| !n.is_deleted)
            .ok_or(StoreError::NotFound)?;

        note.content = content.to_string();
        note.last_edited_by = Some(editor_id.to_string());
        note.version += 1;
        note.updated_at = Utc::now();

        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(note.clone())
    }
}

/// In-memory identity store.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: UserRecord) {
        self.users.lock().unwrap().insert(user.id.clone(), user);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.lock().unwrap().get(id).cloned())
    }
}
