//! InMemory directory 実装
//!
//! Implements both `UserDirectory` and `RoomDirectory` over hash maps. The
//! server binary seeds it from a JSON fixture:
//!
//! ```json
//! { "users": [{"id": 1, "name": "Alice", "telegramName": "alice"}],
//!   "clubs": [{"chatId": "6f1c2a4e-8d2b-4c53-9a4e-0f3b7a9d1e22", "name": "Rust"}] }
//! ```

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{DirectoryError, RoomDirectory, RoomId, UserDirectory, UserId, UserProfile};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryFixture {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub clubs: Vec<ClubRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub telegram_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubRecord {
    pub chat_id: Uuid,
    pub name: String,
}

/// In-memory user and room directory
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    users: HashMap<UserId, UserProfile>,
    /// Club name by chat id
    clubs: HashMap<RoomId, String>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: UserId, profile: UserProfile) -> Self {
        self.users.insert(user_id, profile);
        self
    }

    pub fn with_club(mut self, room_id: RoomId, name: impl Into<String>) -> Self {
        self.clubs.insert(room_id, name.into());
        self
    }

    pub fn from_fixture(fixture: DirectoryFixture) -> Result<Self, DirectoryError> {
        let mut directory = Self::new();
        for user in fixture.users {
            let user_id = UserId::new(user.id)
                .map_err(|e| DirectoryError::InvalidData(e.to_string()))?;
            directory.users.insert(
                user_id,
                UserProfile {
                    name: user.name,
                    telegram_name: user.telegram_name,
                },
            );
        }
        for club in fixture.clubs {
            directory.clubs.insert(RoomId::new(club.chat_id), club.name);
        }
        Ok(directory)
    }

    /// Load a JSON fixture from disk
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DirectoryError::Unavailable(format!("{}: {}", path.display(), e)))?;
        let fixture: DirectoryFixture = serde_json::from_str(&raw)
            .map_err(|e| DirectoryError::InvalidData(format!("{}: {}", path.display(), e)))?;
        Self::from_fixture(fixture)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn club_count(&self) -> usize {
        self.clubs.len()
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn resolve_user(&self, user_id: UserId) -> Result<Option<UserProfile>, DirectoryError> {
        Ok(self.users.get(&user_id).cloned())
    }
}

#[async_trait]
impl RoomDirectory for InMemoryDirectory {
    async fn resolve_room_title(&self, room_id: RoomId) -> Result<Option<String>, DirectoryError> {
        Ok(self.clubs.get(&room_id).map(|name| format!("{} Chat", name)))
    }
}
