//! WebSocket connection handler.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{domain::RoomId, infrastructure::socket::split_websocket, ui::state::AppState};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub chat_id: Option<String>,
}

/// `GET /ws?chat_id=<uuid>`
///
/// The room id is validated before the upgrade; a bad request never touches
/// the registry.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Response {
    let Some(raw_chat_id) = query.chat_id.filter(|id| !id.trim().is_empty()) else {
        tracing::warn!("Rejecting connection without chat_id");
        return (StatusCode::BAD_REQUEST, "chat_id is required").into_response();
    };

    let room_id = match RoomId::try_from(raw_chat_id.as_str()) {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!("Invalid chat_id format: '{}'", raw_chat_id);
            return (StatusCode::BAD_REQUEST, "Invalid chat_id value").into_response();
        }
    };

    let max_message_size = state.registry.config().max_message_size;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state, room_id))
        .into_response()
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room_id: RoomId) {
    let (sink, stream) = split_websocket(socket);
    match state.registry.connect(room_id, sink, stream).await {
        Ok(connection_id) => {
            tracing::debug!(room_id = %room_id, connection_id = %connection_id, "Pump started");
        }
        Err(e) => {
            tracing::warn!(room_id = %room_id, "Failed to start connection: {}", e);
        }
    }
}
