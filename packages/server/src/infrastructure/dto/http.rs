//! HTTP API response DTOs.

use serde::Serialize;

use super::websocket::WireMessage;

/// One live room in `GET /api/rooms`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub chat_id: String,
    pub title: String,
    /// Number of joined connections
    pub clients: usize,
    /// Number of stored history entries
    pub history: usize,
}

/// `GET /api/rooms/{chat_id}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub chat_id: String,
    pub title: String,
    /// User ids of joined connections, sorted
    pub members: Vec<String>,
    pub history: Vec<WireMessage>,
}
