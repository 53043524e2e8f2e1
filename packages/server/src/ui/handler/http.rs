//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::RoomId,
    infrastructure::dto::{
        WireMessage,
        http::{RoomDetailDto, RoomSummaryDto},
    },
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Live rooms, ordered by chat id
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let mut summaries = Vec::new();
    for session in state.registry.sessions().await {
        // Domain Model から DTO への変換
        summaries.push(RoomSummaryDto {
            chat_id: session.room_id().to_string(),
            title: session.title().to_string(),
            clients: session.client_count().await,
            history: session.history_len().await,
        });
    }
    Json(summaries)
}

/// Get room detail by chat id
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let room_id = RoomId::try_from(chat_id.as_str()).map_err(|_| {
        tracing::warn!("Invalid chat_id format: '{}'", chat_id);
        StatusCode::BAD_REQUEST
    })?;

    let session = state
        .registry
        .get_session(room_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    let members = session
        .members()
        .await
        .into_iter()
        .map(|user_id| user_id.to_string())
        .collect();
    let history = session
        .history()
        .await
        .iter()
        .map(WireMessage::from)
        .collect();

    Ok(Json(RoomDetailDto {
        chat_id: room_id.to_string(),
        title: session.title().to_string(),
        members,
        history,
    }))
}
