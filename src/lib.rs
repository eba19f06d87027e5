pub mod collab;
pub mod config;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod ot;
pub mod routes;
pub mod services;
pub mod store;
pub mod ws;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::collab::CollabHub;
use crate::config::Config;
use crate::docs::ApiDoc;
use crate::routes::create_api_routes;
use crate::ws::handler::websocket_handler;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub hub: CollabHub,
}

/// Assemble the full application router: WebSocket endpoint, API routes,
/// and Swagger UI.
pub fn create_app(state: Arc<AppState>) -> Router {
    let api_routes = create_api_routes(state.clone());
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/ws", get(websocket_handler))
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    match &config.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    }
}
