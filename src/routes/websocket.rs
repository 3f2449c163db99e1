//! WebSocket upgrade endpoint.

use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};

use crate::{services::websocket_service, state::SharedState};

/// `GET /ws`: upgrade and hand the socket to the service layer.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> Response {
    ws.on_upgrade(move |socket| websocket_service::handle_socket(socket, state))
}
