use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::info;

use crate::models::DiagnosticsResponse;
use crate::AppState;

/// Operational counters for the collaboration hub
pub async fn diagnostics(State(state): State<Arc<AppState>>) -> Json<DiagnosticsResponse> {
    let stats = state.hub.stats().await;

    info!(
        "Diagnostics: Sessions: {}, Rooms: {}, Members: {}, Global: {}, Pending saves: {}",
        stats.total_sessions,
        stats.active_documents,
        stats.total_active_users,
        stats.global_subscribers,
        stats.pending_saves
    );

    Json(stats)
}
