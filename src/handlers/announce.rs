use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use tracing::warn;

use crate::models::{
    AnnounceCreatedRequest, AnnounceDeletedRequest, AnnounceUpdatedRequest, ErrorResponse,
    UserView,
};
use crate::AppState;

/// Document lifecycle announcements from the main application.
///
/// The actor ids in the payloads reference users in the identity store;
/// an unknown actor is a caller bug and is rejected.
async fn resolve_actor(
    state: &AppState,
    user_id: &str,
) -> Result<UserView, (StatusCode, Json<ErrorResponse>)> {
    match state.hub.user_store().find_by_id(user_id).await {
        Ok(Some(record)) => Ok(UserView::from(&record)),
        Ok(None) => {
            warn!("Announcement references unknown user: {}", user_id);
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    code: 404,
                    status: "Not Found".to_string(),
                    error: format!("Unknown user: {}", user_id),
                }),
            ))
        }
        Err(e) => {
            warn!("Identity lookup failed for {}: {}", user_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    code: 500,
                    status: "Internal Server Error".to_string(),
                    error: "Identity lookup failed".to_string(),
                }),
            ))
        }
    }
}

pub async fn announce_created(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnnounceCreatedRequest>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let creator = resolve_actor(&state, &req.creator_id).await?;
    state.hub.announce_created(req.document, creator).await;
    Ok(StatusCode::ACCEPTED)
}

pub async fn announce_updated(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnnounceUpdatedRequest>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let editor = resolve_actor(&state, &req.editor_id).await?;
    state
        .hub
        .announce_updated(req.document, editor, req.changes)
        .await;
    Ok(StatusCode::ACCEPTED)
}

pub async fn announce_deleted(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnnounceDeletedRequest>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let deleter = resolve_actor(&state, &req.deleter_id).await?;
    state.hub.announce_deleted(req.document, deleter).await;
    Ok(StatusCode::ACCEPTED)
}
