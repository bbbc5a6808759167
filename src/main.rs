use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use partyrounds::{
    api, auth, broadcast,
    config::{ContentConfig, GameTuning, ServerConfig},
    state::AppState,
    ws,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "partyrounds=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Party Rounds...");

    let server_config = ServerConfig::from_env();
    let tuning = GameTuning::from_env();
    let content_config = ContentConfig::from_env();
    let auth_config = Arc::new(auth::AuthConfig::from_env());

    let state = match AppState::from_config(&content_config, tuning) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!(
                "Failed to set up content store: {}. Falling back to the built-in library.",
                e
            );
            Arc::new(AppState::with_store(
                Arc::new(partyrounds::content::MemoryContentStore::with_fallback()),
                tuning,
            ))
        }
    };

    // Spawn background task for removing abandoned rooms
    broadcast::spawn_room_reaper(state.clone(), server_config.room_ttl);

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .merge(api::router(auth_config))
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
