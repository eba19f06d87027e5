use std::sync::Arc;

use axum::http;
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use tracing::info;

use crate::models::UserView;
use crate::store::UserStore;

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken(String),
    NotUserToken,
    UnknownUser,
    InactiveUser,
    Backend(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "missing auth token"),
            AuthError::InvalidToken(e) => write!(f, "invalid auth token: {}", e),
            AuthError::NotUserToken => write!(f, "token is not a user token"),
            AuthError::UnknownUser => write!(f, "token subject is not a known user"),
            AuthError::InactiveUser => write!(f, "user account is deactivated"),
            AuthError::Backend(e) => write!(f, "identity lookup failed: {}", e),
        }
    }
}

impl std::error::Error for AuthError {}

// Get the auth token from a request
pub fn get_auth_token<B>(req: &http::Request<B>) -> Result<String, String> {
    // 1. Try to get token from Authorization header
    if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| "Invalid Authorization header".to_string())?;
        Ok(auth_str
            .strip_prefix("Bearer ")
            .unwrap_or(auth_str)
            .to_string())
    }
    // 2. Try to get token from cookies
    else {
        let cookie_header = req
            .headers()
            .get(http::header::COOKIE)
            .ok_or_else(|| "Missing Authorization header or Cookie".to_string())?
            .to_str()
            .map_err(|_| "Invalid Cookie header".to_string())?;

        for cookie in cookie::Cookie::split_parse(cookie_header) {
            if let Ok(c) = cookie {
                if c.name() == "auth_token" {
                    return Ok(c.value().to_string());
                }
            }
        }
        Err("auth_token cookie not found".to_string())
    }
}

// Validate a JWT token and return the token data
pub fn validate_jwt(
    token: &str,
    secret: &str,
) -> Result<TokenData<serde_json::Value>, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<serde_json::Value>(token, &decoding_key, &validation)
}

/// Resolve a session token to an active user identity.
///
/// The token must be a user token (claim `type: "user"`), its `sub` must
/// name a known user, and that user must be active.
pub async fn authenticate_session(
    token: Option<&str>,
    secret: &str,
    users: &Arc<dyn UserStore>,
) -> Result<UserView, AuthError> {
    let token = token.ok_or(AuthError::MissingToken)?;
    let token = token.strip_prefix("Bearer ").unwrap_or(token);

    let token_data =
        validate_jwt(token, secret).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    let token_type = token_data
        .claims
        .get("type")
        .and_then(|v| v.as_str())
        .unwrap_or("user");
    if token_type != "user" {
        return Err(AuthError::NotUserToken);
    }

    let uid = token_data
        .claims
        .get("sub")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AuthError::InvalidToken("missing 'sub' claim".to_string()))?;

    let record = users
        .find_by_id(uid)
        .await
        .map_err(|e| AuthError::Backend(e.to_string()))?
        .ok_or(AuthError::UnknownUser)?;

    if !record.is_active {
        return Err(AuthError::InactiveUser);
    }

    info!("Session token validated successfully for user: {}", uid);
    Ok(UserView::from(&record))
}
