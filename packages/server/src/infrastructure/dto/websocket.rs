//! WebSocket message DTOs.
//!
//! Every frame is one JSON object. The kind is carried in `kind`; `type` is
//! accepted on input for older mobile clients.

use chrono::{DateTime, Utc};
use clubchat_shared::time::to_rfc3339_utc;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Errors while decoding or encoding a frame
#[derive(Debug, Error)]
pub enum WireError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("'{field}' is required for '{kind}' messages")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("kind must not be empty")]
    EmptyKind,

    #[error("invalid chatId '{0}'")]
    InvalidChatId(String),
}

/// Flat wire representation shared by every message kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    #[serde(alias = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,

    /// Resolved display name of the sender (outgoing chat frames only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<WireMessage>>,

    /// Server-assigned; unparsable client values are treated as absent
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        serialize_with = "rfc3339_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Keys that map onto `WireMessage` fields; everything else is an extra field
/// of a pass-through message.
pub(crate) const RESERVED_KEYS: [&str; 3] = ["kind", "type", "timestamp"];

/// Strings and numbers are kept as text; any other value counts as absent.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn rfc3339_millis<S>(timestamp: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match timestamp {
        Some(timestamp) => serializer.serialize_str(&to_rfc3339_utc(timestamp)),
        None => serializer.serialize_none(),
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc)))
}
