use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response for diagnostics information
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsResponse {
    pub total_sessions: u32,
    pub active_documents: u32,
    pub total_active_users: u32,
    pub global_subscribers: u32,
    pub pending_saves: u32,
}
