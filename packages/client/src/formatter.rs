//! Message formatting utilities for client display.

use chrono::{DateTime, Utc};
use clubchat_server::infrastructure::dto::WireMessage;
use clubchat_shared::time::to_local_clock;

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Render one frame received from the server
    pub fn format_incoming(message: &WireMessage) -> String {
        match message.kind.as_str() {
            "history" => Self::format_history(
                message.title.as_deref().unwrap_or("Chat"),
                message.history.as_deref().unwrap_or_default(),
            ),
            "system" => Self::format_system(
                message.text.as_deref().unwrap_or_default(),
                message.timestamp.as_ref(),
            ),
            "chat" => Self::format_chat_message(
                Self::sender(message),
                message.text.as_deref().unwrap_or_default(),
                message.timestamp.as_ref(),
            ),
            "error" => Self::format_error(message.text.as_deref().unwrap_or_default()),
            other => format!("\n← [{}] {}\n", other, message.text.as_deref().unwrap_or("")),
        }
    }

    /// Format the room snapshot received right after connecting
    pub fn format_history(title: &str, history: &[WireMessage]) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n\n{}\n", RULE));
        output.push_str(&format!("{}\n", title));

        if history.is_empty() {
            output.push_str("(No messages yet)\n");
        } else {
            for entry in history {
                let text = entry.text.as_deref().unwrap_or_default();
                let time = Self::clock(entry.timestamp.as_ref());
                match entry.kind.as_str() {
                    "chat" => output.push_str(&format!(
                        "[{}] @{}: {}\n",
                        time,
                        Self::sender(entry),
                        text
                    )),
                    _ => output.push_str(&format!("[{}] * {}\n", time, text)),
                }
            }
        }

        output.push_str(&format!("{}\n", RULE));
        output
    }

    /// Format a system notice such as "alice joined the chat"
    pub fn format_system(text: &str, at: Option<&DateTime<Utc>>) -> String {
        format!("\n* {} ({})\n", text, Self::clock(at))
    }

    /// Format a chat message
    pub fn format_chat_message(from: &str, content: &str, sent_at: Option<&DateTime<Utc>>) -> String {
        format!(
            "\n\n{}\n@{}: {}\nsent at {}\n{}\n",
            THIN_RULE,
            from,
            content,
            Self::clock(sent_at),
            THIN_RULE
        )
    }

    pub fn format_error(text: &str) -> String {
        format!("\n! {}\n", text)
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }

    fn sender(message: &WireMessage) -> &str {
        message
            .nickname
            .as_deref()
            .or(message.user_id.as_deref())
            .unwrap_or("unknown")
    }

    fn clock(at: Option<&DateTime<Utc>>) -> String {
        at.map(to_local_clock)
            .unwrap_or_else(|| "--:--:--".to_string())
    }
}
