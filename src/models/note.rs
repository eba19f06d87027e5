use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Document snapshot as held by the external document store.
///
/// The store's `version` field is ground truth at join/sync time; it is
/// bumped on every durable write.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    /// User id of the owner.
    pub owner: String,
    #[serde(default)]
    pub collaborators: Vec<Collaborator>,
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub version: i64,
    pub last_edited_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl NoteRecord {
    /// Read capability: owner, explicit collaborator, or public visibility.
    pub fn can_read(&self, user_id: &str) -> bool {
        self.owner == user_id
            || self.is_public
            || self.collaborators.iter().any(|c| c.user_id == user_id)
    }

    /// Write capability: owner, or collaborator whose role is not read-only.
    pub fn can_edit(&self, user_id: &str) -> bool {
        self.owner == user_id
            || self
                .collaborators
                .iter()
                .any(|c| c.user_id == user_id && c.role != CollabRole::ReadOnly)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub user_id: String,
    pub role: CollabRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CollabRole {
    ReadOnly,
    ReadWrite,
}

/// Old/new value pair for a single changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange<T> {
    pub old: T,
    pub new: T,
}

/// Field-change map attached to a document update announcement.
///
/// The `is_public` transition decides whether the update is broadcast on
/// the global channel and whether a privatized notice is emitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub title: Option<FieldChange<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub is_public: Option<FieldChange<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub tags: Option<FieldChange<Vec<String>>>,
}

impl FieldChanges {
    pub fn became_public(&self) -> bool {
        self.is_public.as_ref().map_or(false, |c| !c.old && c.new)
    }

    pub fn became_private(&self) -> bool {
        self.is_public.as_ref().map_or(false, |c| c.old && !c.new)
    }
}
