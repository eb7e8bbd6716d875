use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use dashmap::DashMap;

use bichat_core::config::BichatConfig;
use bichat_coordinator::ConversationCoordinator;

use crate::broker::Broker;

/// Central shared state, passed as `Arc<AppState>` to every Axum handler.
pub struct AppState {
    pub config: BichatConfig,
    pub broker: Arc<Broker>,
    pub coordinator: ConversationCoordinator,
    /// Active WS connections, tracked for the `/health` gauge.
    pub ws_clients: DashMap<String, ()>,
}

impl AppState {
    pub fn new(config: BichatConfig, broker: Arc<Broker>, coordinator: ConversationCoordinator) -> Self {
        Self {
            config,
            broker,
            coordinator,
            ws_clients: DashMap::new(),
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/api/v1/config", get(crate::http::config::config_handler))
        .route("/ws", get(crate::ws::connection::ws_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
}
