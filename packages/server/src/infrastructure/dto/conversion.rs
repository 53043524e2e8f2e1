//! Conversion logic between wire DTOs and the domain message model.

use serde_json::{Map, Value};

use crate::domain::{ChatMessage, MessageBody, MessageKind, RoomId};

use super::websocket::{RESERVED_KEYS, WireError, WireMessage};

// ========================================
// Wire → Domain
// ========================================

/// Decode one inbound text frame.
///
/// Unknown kinds become `MessageBody::Other` carrying every non-reserved field.
pub fn decode_message(text: &str) -> Result<ChatMessage, WireError> {
    let wire: WireMessage = serde_json::from_str(text)?;
    if MessageKind::parse(&wire.kind).is_some() {
        return ChatMessage::try_from(wire);
    }

    let mut fields: Map<String, Value> = serde_json::from_str(text)?;
    for key in RESERVED_KEYS.iter().chain(["chatId"].iter()) {
        fields.remove(*key);
    }
    let chat_id = parse_chat_id(wire.chat_id.as_deref())?;
    if wire.kind.trim().is_empty() {
        return Err(WireError::EmptyKind);
    }
    Ok(ChatMessage {
        chat_id,
        body: MessageBody::Other {
            kind: wire.kind,
            fields,
        },
        timestamp: wire.timestamp,
    })
}

fn parse_chat_id(raw: Option<&str>) -> Result<Option<RoomId>, WireError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => RoomId::try_from(raw)
            .map(Some)
            .map_err(|_| WireError::InvalidChatId(raw.to_string())),
    }
}

fn required(
    value: Option<String>,
    kind: MessageKind,
    field: &'static str,
) -> Result<String, WireError> {
    value.ok_or(WireError::MissingField {
        kind: kind.as_str(),
        field,
    })
}

impl TryFrom<WireMessage> for ChatMessage {
    type Error = WireError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let Some(kind) = MessageKind::parse(&wire.kind) else {
            return Ok(ChatMessage {
                chat_id: parse_chat_id(wire.chat_id.as_deref())?,
                body: MessageBody::Other {
                    kind: wire.kind,
                    fields: Map::new(),
                },
                timestamp: wire.timestamp,
            });
        };

        let body = match kind {
            // A join without a usable userId still reaches the session, which
            // answers it with an error and closes the connection
            MessageKind::Join => MessageBody::Join {
                user_id: wire.user_id.unwrap_or_default(),
            },
            MessageKind::Chat => MessageBody::Chat {
                user_id: required(wire.user_id, kind, "userId")?,
                text: required(wire.text, kind, "text")?,
            },
            MessageKind::System => MessageBody::System {
                text: wire.text.unwrap_or_default(),
            },
            MessageKind::Error => MessageBody::Error {
                text: wire.text.unwrap_or_default(),
            },
            MessageKind::History => MessageBody::History {
                title: wire.title.unwrap_or_default(),
                history: wire
                    .history
                    .unwrap_or_default()
                    .into_iter()
                    .map(ChatMessage::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            },
        };

        Ok(ChatMessage {
            chat_id: parse_chat_id(wire.chat_id.as_deref())?,
            body,
            timestamp: wire.timestamp,
        })
    }
}

// ========================================
// Domain → Wire
// ========================================

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        let mut wire = WireMessage {
            kind: message.kind_name().to_string(),
            chat_id: message.chat_id.map(|id| id.to_string()),
            timestamp: message.timestamp,
            ..WireMessage::default()
        };

        match &message.body {
            MessageBody::Join { user_id } => {
                wire.user_id = Some(user_id.clone());
            }
            MessageBody::Chat { user_id, text } => {
                wire.user_id = Some(user_id.clone());
                wire.text = Some(text.clone());
            }
            MessageBody::System { text } | MessageBody::Error { text } => {
                wire.text = Some(text.clone());
            }
            MessageBody::History { title, history } => {
                wire.title = Some(title.clone());
                wire.history = Some(history.iter().map(WireMessage::from).collect());
            }
            MessageBody::Other { .. } => {}
        }

        wire
    }
}

/// Encode a message as one JSON text frame
pub fn encode_message(message: &ChatMessage) -> Result<String, WireError> {
    encode(message, None)
}

/// Encode a chat message with the sender's resolved display name attached
pub fn encode_with_nickname(message: &ChatMessage, nickname: &str) -> Result<String, WireError> {
    encode(message, Some(nickname))
}

fn encode(message: &ChatMessage, nickname: Option<&str>) -> Result<String, WireError> {
    let mut wire = WireMessage::from(message);
    wire.nickname = nickname.map(str::to_string);

    let MessageBody::Other { fields, .. } = &message.body else {
        return Ok(serde_json::to_string(&wire)?);
    };

    let mut value = serde_json::to_value(&wire)?;
    if let Value::Object(object) = &mut value {
        for (key, field) in fields {
            object.entry(key.clone()).or_insert_with(|| field.clone());
        }
    }
    Ok(serde_json::to_string(&value)?)
}
