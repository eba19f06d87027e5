use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::{
    announce_created, announce_deleted, announce_updated, diagnostics, health_check, ready_check,
};
use crate::routes::auth_middleware::service_auth_middleware;
use crate::AppState;

/// Create API routes
pub fn create_api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let service_routes = Router::new()
        .route("/v1/diagnostics", get(diagnostics))
        .route("/v1/announce/created", post(announce_created))
        .route("/v1/announce/updated", post(announce_updated))
        .route("/v1/announce/deleted", post(announce_deleted))
        // Applies to all routes added above
        .route_layer(middleware::from_fn_with_state(state, service_auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .merge(service_routes)
}
