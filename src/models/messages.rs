use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{FieldChanges, NoteRecord, UserView};
use crate::ot::Operation;

/// Messages a client may send over the WebSocket, tagged by event name.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "join-document")]
    JoinDocument(JoinDocumentMessage),
    #[serde(rename = "leave-document")]
    LeaveDocument(LeaveDocumentMessage),
    #[serde(rename = "typing-start")]
    TypingStart(TypingStartMessage),
    #[serde(rename = "typing-stop")]
    TypingStop(TypingStopMessage),
    #[serde(rename = "cursor-position")]
    CursorPosition(CursorPositionMessage),
    #[serde(rename = "content-change")]
    ContentChange(ContentChangeMessage),
    #[serde(rename = "request-sync")]
    RequestSync(RequestSyncMessage),
    #[serde(rename = "join-global")]
    JoinGlobal,
    #[serde(rename = "leave-global")]
    LeaveGlobal,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JoinDocumentMessage {
    pub document_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LeaveDocumentMessage {
    pub document_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TypingStartMessage {
    pub document_id: String,
    pub cursor_position: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TypingStopMessage {
    pub document_id: String,
}

/// A live cursor move. Ephemeral presence data: relayed, never stored.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CursorPositionMessage {
    pub document_id: String,
    pub position: Option<usize>,
    pub selection: Option<SelectionRange>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

/// A client-side edit. `content` always carries the complete current text;
/// `operation` is the diff-derived edit the client applied locally.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ContentChangeMessage {
    pub document_id: String,
    pub content: String,
    pub operation: Option<Operation>,
    pub position: Option<usize>,
    pub length: Option<usize>,
    pub timestamp: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RequestSyncMessage {
    pub document_id: String,
    pub client_version: Option<i64>,
}

/// Messages the server emits, tagged by event name.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "connected")]
    Connected(ConnectedMessage),
    #[serde(rename = "document-joined")]
    DocumentJoined(DocumentJoinedMessage),
    #[serde(rename = "document-left")]
    DocumentLeft(DocumentLeftMessage),
    #[serde(rename = "user-joined")]
    UserJoined(UserJoinedMessage),
    #[serde(rename = "user-left")]
    UserLeft(UserLeftMessage),
    #[serde(rename = "user-typing-start")]
    UserTypingStart(UserTypingStartMessage),
    #[serde(rename = "user-typing-stop")]
    UserTypingStop(UserTypingStopMessage),
    #[serde(rename = "user-cursor-position")]
    UserCursorPosition(UserCursorPositionMessage),
    #[serde(rename = "content-changed")]
    ContentChanged(ContentChangedMessage),
    #[serde(rename = "sync-response")]
    SyncResponse(SyncResponseMessage),
    #[serde(rename = "auto-saved")]
    AutoSaved(AutoSavedMessage),
    #[serde(rename = "save-error")]
    SaveError(SaveErrorMessage),
    #[serde(rename = "global-joined")]
    GlobalJoined(GlobalAckMessage),
    #[serde(rename = "global-left")]
    GlobalLeft(GlobalAckMessage),
    #[serde(rename = "public-doc-created")]
    PublicDocCreated(PublicDocCreatedMessage),
    #[serde(rename = "public-doc-updated")]
    PublicDocUpdated(PublicDocUpdatedMessage),
    #[serde(rename = "public-doc-privatized")]
    PublicDocPrivatized(PublicDocPrivatizedMessage),
    #[serde(rename = "public-doc-deleted")]
    PublicDocDeleted(PublicDocDeletedMessage),
    #[serde(rename = "error")]
    Error(ErrorMessage),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub message: String,
    pub user_id: String,
    pub timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DocumentJoinedMessage {
    pub document_id: String,
    pub document: NoteRecord,
    pub active_users: Vec<UserView>,
    pub can_edit: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLeftMessage {
    pub document_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserJoinedMessage {
    pub user: UserView,
    pub document_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserLeftMessage {
    pub user_id: String,
    pub document_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserTypingStartMessage {
    pub user_id: String,
    pub user: UserView,
    pub document_id: String,
    pub cursor_position: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserTypingStopMessage {
    pub user_id: String,
    pub document_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserCursorPositionMessage {
    pub user_id: String,
    pub user: UserView,
    pub document_id: String,
    pub position: Option<usize>,
    pub selection: Option<SelectionRange>,
}

/// Relay of a content change to the other room members. `version` is the
/// store's version the change was accepted against, so receivers can detect
/// divergence and fall back to `request-sync`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ContentChangedMessage {
    pub user_id: String,
    pub user: UserView,
    pub document_id: String,
    pub operation: Option<Operation>,
    pub content: String,
    pub position: Option<usize>,
    pub length: Option<usize>,
    pub timestamp: i64,
    pub version: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponseMessage {
    pub document_id: String,
    pub content: String,
    pub version: i64,
    pub last_edited_by: Option<UserView>,
    pub updated_at: DateTime<Utc>,
    pub needs_sync: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AutoSavedMessage {
    pub document_id: String,
    pub version: i64,
    pub timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SaveErrorMessage {
    pub document_id: String,
    pub error: String,
    pub timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GlobalAckMessage {
    pub message: String,
    pub timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PublicDocCreatedMessage {
    pub document: NoteRecord,
    pub creator: UserView,
    pub timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PublicDocUpdatedMessage {
    pub document: NoteRecord,
    pub editor: UserView,
    pub changes: FieldChanges,
    pub timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PublicDocPrivatizedMessage {
    pub document_id: String,
    pub title: String,
    pub timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PublicDocDeletedMessage {
    pub document_id: String,
    pub title: String,
    pub deleter: UserView,
    pub timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    pub message: String,
}
