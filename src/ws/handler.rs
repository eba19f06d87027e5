use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::collab::SessionId;
use crate::models::{ClientMessage, UserView};
use crate::services::auth_service;
use crate::AppState;

#[derive(Deserialize)]
pub struct WsParams {
    token: Option<String>,
}

/// WebSocket entry point. Authentication happens before the upgrade so a
/// bad token is an HTTP 401, never a half-open socket.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    State(app_state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    info!("New WebSocket connection attempt");

    let secret = match &app_state.config.auth_jwt_secret {
        Some(secret) => secret,
        None => {
            error!("Auth JWT secret not configured");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    // Token from the query string, with the Authorization header as
    // fallback for non-browser clients.
    let token = params.token.clone().or_else(|| {
        headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    });

    let users = app_state.hub.user_store();
    let user = match auth_service::authenticate_session(token.as_deref(), secret, &users).await {
        Ok(user) => user,
        Err(e) => {
            warn!("WebSocket authentication failed: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, user, app_state)))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, user: UserView, app_state: Arc<AppState>) {
    let hub = app_state.hub.clone();

    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    // Per-session outbound queue; the hub pushes events into it and the
    // send task drains it onto the wire.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let session_id = hub.connect(user.clone(), tx).await;

    info!(
        "WebSocket connection established for user {} (session {})",
        user.id, session_id
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize outbound message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let recv_hub = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        // Only text frames carry protocol messages; anything else is
        // ignored and a closed/errored stream ends the loop.
        while let Some(Ok(Message::Text(msg))) = receiver.next().await {
            let client_msg: ClientMessage = match serde_json::from_str(&msg) {
                Ok(client_msg) => client_msg,
                Err(e) => {
                    warn!("Malformed message from session {}: {}", session_id, e);
                    recv_hub.send_error(session_id, "Malformed message").await;
                    continue;
                }
            };
            dispatch(&recv_hub, session_id, client_msg).await;
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    hub.disconnect(session_id).await;
    info!("WebSocket connection terminated for user {}", user.id);
}

async fn dispatch(hub: &crate::collab::CollabHub, session_id: SessionId, msg: ClientMessage) {
    match msg {
        ClientMessage::JoinDocument(m) => hub.join_document(session_id, &m.document_id).await,
        ClientMessage::LeaveDocument(m) => hub.leave_document(session_id, &m.document_id).await,
        ClientMessage::TypingStart(m) => {
            hub.typing_start(session_id, &m.document_id, m.cursor_position)
                .await
        }
        ClientMessage::TypingStop(m) => hub.typing_stop(session_id, &m.document_id).await,
        ClientMessage::CursorPosition(m) => hub.cursor_position(session_id, m).await,
        ClientMessage::ContentChange(m) => hub.content_change(session_id, m).await,
        ClientMessage::RequestSync(m) => hub.request_sync(session_id, m).await,
        ClientMessage::JoinGlobal => hub.join_global(session_id).await,
        ClientMessage::LeaveGlobal => hub.leave_global(session_id).await,
    }
}
