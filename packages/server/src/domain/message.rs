//! Chat message model.
//!
//! `ChatMessage` is a closed variant type: every kind the chat core reacts to
//! has its own `MessageBody` variant, and anything else is carried as an opaque
//! `Other` body so it can be forwarded without interpretation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::value_object::RoomId;

/// Kinds understood by the chat core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Join,
    Chat,
    System,
    History,
    Error,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Chat => "chat",
            Self::System => "system",
            Self::History => "history",
            Self::Error => "error",
        }
    }

    /// Parse a wire kind name; unknown names yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "join" => Some(Self::Join),
            "chat" => Some(Self::Chat),
            "system" => Some(Self::System),
            "history" => Some(Self::History),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload of a chat message
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    /// A client announcing which user it speaks for.
    ///
    /// `user_id` is kept exactly as asserted; the session validates it.
    Join { user_id: String },
    /// A line of chat text from a user
    Chat { user_id: String, text: String },
    /// Server-generated notice (e.g. "alice joined the chat")
    System { text: String },
    /// Snapshot sent to a freshly connected socket; never stored in history
    History {
        title: String,
        history: Vec<ChatMessage>,
    },
    /// Error addressed to a single connection
    Error { text: String },
    /// Unrecognized kind, forwarded verbatim
    Other {
        kind: String,
        fields: Map<String, Value>,
    },
}

/// One message flowing through a chat room
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// Room the message belongs to
    pub chat_id: Option<RoomId>,
    pub body: MessageBody,
    /// Set by the session when the message is accepted
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatMessage {
    pub fn new(chat_id: Option<RoomId>, body: MessageBody) -> Self {
        Self {
            chat_id,
            body,
            timestamp: None,
        }
    }

    pub fn join(chat_id: Option<RoomId>, user_id: impl Into<String>) -> Self {
        Self::new(
            chat_id,
            MessageBody::Join {
                user_id: user_id.into(),
            },
        )
    }

    pub fn chat(
        chat_id: Option<RoomId>,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::new(
            chat_id,
            MessageBody::Chat {
                user_id: user_id.into(),
                text: text.into(),
            },
        )
    }

    pub fn system(chat_id: RoomId, text: impl Into<String>) -> Self {
        Self::new(Some(chat_id), MessageBody::System { text: text.into() })
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(None, MessageBody::Error { text: text.into() })
    }

    pub fn history(title: impl Into<String>, history: Vec<ChatMessage>) -> Self {
        Self::new(
            None,
            MessageBody::History {
                title: title.into(),
                history,
            },
        )
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Known kind of this message, `None` for opaque pass-through bodies
    pub fn kind(&self) -> Option<MessageKind> {
        match &self.body {
            MessageBody::Join { .. } => Some(MessageKind::Join),
            MessageBody::Chat { .. } => Some(MessageKind::Chat),
            MessageBody::System { .. } => Some(MessageKind::System),
            MessageBody::History { .. } => Some(MessageKind::History),
            MessageBody::Error { .. } => Some(MessageKind::Error),
            MessageBody::Other { .. } => None,
        }
    }

    /// Kind name as it appears on the wire
    pub fn kind_name(&self) -> &str {
        match &self.body {
            MessageBody::Other { kind, .. } => kind,
            _ => self.kind().map(|kind| kind.as_str()).unwrap_or_default(),
        }
    }

    /// Asserted sender of a join or chat message
    pub fn user_id(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Join { user_id } | MessageBody::Chat { user_id, .. } => Some(user_id),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Chat { text, .. }
            | MessageBody::System { text }
            | MessageBody::Error { text } => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_roundtrips_known_names() {
        // テスト項目: 既知の種別名は MessageKind に変換でき、as_str で元に戻る
        // given (前提条件):
        let names = ["join", "chat", "system", "history", "error"];

        for name in names {
            // when (操作):
            let kind = MessageKind::parse(name);

            // then (期待する結果):
            assert_eq!(kind.map(|k| k.as_str()), Some(name));
        }
    }

    #[test]
    fn test_kind_parse_unknown_name() {
        // テスト項目: 未知の種別名は None になる
        // given (前提条件):

        // when (操作):
        let kind = MessageKind::parse("typing");

        // then (期待する結果):
        assert_eq!(kind, None);
    }

    #[test]
    fn test_other_body_reports_its_wire_kind() {
        // テスト項目: Other ボディは種別を持たないが、ワイヤ上の種別名を保持する
        // given (前提条件):
        let message = ChatMessage::new(
            None,
            MessageBody::Other {
                kind: "typing".to_string(),
                fields: Map::new(),
            },
        );

        // when (操作):
        let kind = message.kind();
        let name = message.kind_name();

        // then (期待する結果):
        assert_eq!(kind, None);
        assert_eq!(name, "typing");
    }

    #[test]
    fn test_accessors_expose_sender_and_text() {
        // テスト項目: chat メッセージから送信者とテキストを取り出せる
        // given (前提条件):
        let message = ChatMessage::chat(None, "7", "hello");

        // when (操作):
        let user_id = message.user_id();
        let text = message.text();

        // then (期待する結果):
        assert_eq!(user_id, Some("7"));
        assert_eq!(text, Some("hello"));
        assert_eq!(message.kind(), Some(MessageKind::Chat));
    }
}
