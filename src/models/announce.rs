use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{FieldChanges, NoteRecord};

/// Body for the announce-created entry point. The external mutation handler
/// passes the document snapshot it just persisted plus the acting user id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnnounceCreatedRequest {
    pub document: NoteRecord,
    pub creator_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnnounceUpdatedRequest {
    pub document: NoteRecord,
    pub editor_id: String,
    #[serde(default)]
    pub changes: FieldChanges,
}

/// The document is already gone from the store at announce time, so the
/// caller supplies the pre-delete snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnnounceDeletedRequest {
    pub document: NoteRecord,
    pub deleter_id: String,
}
