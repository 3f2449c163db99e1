//! HTTP surface: health probe and the WebSocket entry point.

pub mod health;
pub mod websocket;

use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::SharedState;

/// Assemble the application router.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/healthcheck", get(health::healthcheck))
        .route("/ws", get(websocket::websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
