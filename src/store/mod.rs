//! Seams to the external document and identity stores.
//!
//! Persistent storage and account management are external collaborators;
//! the hub only needs lookup, a versioned content write, and the identity
//! fields required for presence payloads. `memory` provides the in-memory
//! implementation used in tests and standalone mode.

use async_trait::async_trait;

use crate::models::{NoteRecord, UserRecord};

pub mod memory;

pub use memory::{MemoryNoteStore, MemoryUserStore};

#[derive(Debug)]
pub enum StoreError {
    NotFound,
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "record not found"),
            StoreError::Backend(e) => write!(f, "store backend error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Document store consumed by the sync coordinator and the debouncer.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Load a live note by id. Soft-deleted notes are treated as absent.
    async fn find_by_id(&self, id: &str) -> Result<Option<NoteRecord>, StoreError>;

    /// Persist new content: bumps the version, stamps the editor and the
    /// update timestamp, and returns the saved record.
    async fn save_content(
        &self,
        id: &str,
        content: &str,
        editor_id: &str,
    ) -> Result<NoteRecord, StoreError>;
}

/// Identity store consumed by the session authenticator.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;
}
