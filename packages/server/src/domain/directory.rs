//! Collaborators the chat core consults but does not own: the user directory
//! (identity and display names) and the room directory (room titles).
//!
//! ドメイン層がインターフェースを定義し、Infrastructure 層が実装します。

use async_trait::async_trait;

use super::{
    error::DirectoryError,
    value_object::{RoomId, UserId},
};

/// What the chat core needs to know about a user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserProfile {
    pub name: String,
    pub telegram_name: Option<String>,
}

impl UserProfile {
    /// Telegram name when set, otherwise the profile name.
    ///
    /// Returns `None` when neither holds anything but whitespace.
    pub fn display_name(&self) -> Option<&str> {
        self.telegram_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .or_else(|| Some(self.name.trim()).filter(|name| !name.is_empty()))
    }
}

/// User identity lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// `Ok(None)` when no such user exists
    async fn resolve_user(&self, user_id: UserId) -> Result<Option<UserProfile>, DirectoryError>;
}

/// Room metadata lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// `Ok(None)` when the room is unknown
    async fn resolve_room_title(&self, room_id: RoomId) -> Result<Option<String>, DirectoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_telegram_name() {
        // テスト項目: Telegram 名が設定されていればそれが表示名になる
        // given (前提条件):
        let profile = UserProfile {
            name: "Alice Smith".to_string(),
            telegram_name: Some("alice".to_string()),
        };

        // when (操作):
        let name = profile.display_name();

        // then (期待する結果):
        assert_eq!(name, Some("alice"));
    }

    #[test]
    fn test_display_name_falls_back_to_name() {
        // テスト項目: Telegram 名が空なら名前が表示名になる
        // given (前提条件):
        let profile = UserProfile {
            name: "Bob".to_string(),
            telegram_name: Some("  ".to_string()),
        };

        // when (操作):
        let name = profile.display_name();

        // then (期待する結果):
        assert_eq!(name, Some("Bob"));
    }

    #[test]
    fn test_display_name_none_when_blank() {
        // テスト項目: 名前も Telegram 名も空なら表示名はない
        // given (前提条件):
        let profile = UserProfile::default();

        // when (操作):
        let name = profile.display_name();

        // then (期待する結果):
        assert_eq!(name, None);
    }
}
