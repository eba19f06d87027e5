use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{error, info};

use crate::services::auth_service::{get_auth_token, validate_jwt};
use crate::AppState;

/// Guard for the internal announcement surface: only service tokens
/// (claim `type: "service"`) pass.
pub async fn service_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Get the auth token from the request
    let token = match get_auth_token(&req) {
        Ok(token) => token,
        Err(_) => return Err(StatusCode::UNAUTHORIZED),
    };

    // 2. Validate Token
    let secret = match &state.config.auth_jwt_secret {
        Some(secret) => secret,
        None => {
            error!("Auth JWT secret not configured");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    let token_data = match validate_jwt(&token, secret) {
        Ok(token_data) => token_data,
        Err(e) => {
            error!("JWT validation failed: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    // 3. Only service tokens may announce
    let token_type = token_data
        .claims
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            error!("JWT token does not contain 'type' claim");
            StatusCode::UNAUTHORIZED
        })?;
    if token_type != "service" {
        error!("Invalid token type for announcement: {}", token_type);
        return Err(StatusCode::FORBIDDEN);
    }

    // 4. Extract the service name and stash it for downstream handlers
    let service_name = if let Some(sub) = token_data.claims.get("sub").and_then(|v| v.as_str()) {
        sub.to_string()
    } else {
        error!("JWT token does not contain 'sub' claim");
        return Err(StatusCode::UNAUTHORIZED);
    };
    info!("Service token validated successfully for: {}", service_name);
    req.extensions_mut().insert(service_name);

    Ok(next.run(req).await)
}
