mod config;
mod room;
mod signaling;

pub use config::RelayConfig;
pub use room::*;
pub use signaling::*;

use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state handed to every WebSocket connection.
pub struct AppState {
    pub signaling: SignalingService,
    pub room_manager: RoomManager,
}

impl AppState {
    pub fn new(config: &RelayConfig) -> Self {
        let signaling = SignalingService::new(config.ice_servers.clone());
        let room_manager = RoomManager::new(Arc::new(signaling.clone()));
        Self {
            signaling,
            room_manager,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve the relay until the listener fails.
pub async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(&config));
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Relay listening on ws://{}/ws", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
