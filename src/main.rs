use std::panic;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use noteroom::collab::{CollabHub, HubSettings};
use noteroom::config::Config;
use noteroom::store::{MemoryNoteStore, MemoryUserStore};
use noteroom::{create_app, AppState};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "noteroom=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    if config.auth_jwt_secret.is_none() {
        warn!("No auth JWT secret configured - all connections will be rejected");
    }

    // Standalone mode runs against in-memory stores; deployments wire the
    // hub to the real document and identity services here.
    let notes = Arc::new(MemoryNoteStore::new());
    let users = Arc::new(MemoryUserStore::new());
    let hub = CollabHub::new(notes, users, HubSettings::from_config(&config));

    let state = Arc::new(AppState {
        config: config.clone(),
        hub,
    });
    let app = create_app(state);

    // Start the server
    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", config.server_address()));

    info!("🚀 Server running on http://{}", config.server_address());
    info!("📡 WebSocket available at ws://{}/ws", config.server_address());
    info!("📚 Swagger UI available at http://{}/swagger", config.server_address());

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
