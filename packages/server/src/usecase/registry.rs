//! UseCase: ルームレジストリ
//!
//! Maps room ids to their sessions. A session is created on first reference
//! and lives until shutdown.

use std::{collections::HashMap, sync::Arc};

use clubchat_shared::time::{Clock, SystemClock};
use tokio::sync::{Mutex, OnceCell};

use crate::{
    config::ChatConfig,
    domain::{ConnectionId, RoomDirectory, RoomId, SocketSink, SocketStream, UserDirectory},
    shutdown::ShutdownCoordinator,
};

use super::{error::SessionError, pump::start_connection, session::Session};

type SessionSlot = Arc<OnceCell<Arc<Session>>>;

pub struct Registry {
    sessions: Mutex<HashMap<RoomId, SessionSlot>>,
    config: ChatConfig,
    users: Arc<dyn UserDirectory>,
    rooms: Arc<dyn RoomDirectory>,
    clock: Arc<dyn Clock>,
    shutdown: ShutdownCoordinator,
}

impl Registry {
    pub fn new(
        config: ChatConfig,
        users: Arc<dyn UserDirectory>,
        rooms: Arc<dyn RoomDirectory>,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            config,
            users,
            rooms,
            clock: Arc::new(SystemClock),
            shutdown: ShutdownCoordinator::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownCoordinator) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Return the room's session, creating it (and its broadcaster) on first use.
    ///
    /// Concurrent first callers for one room all get the same session; the
    /// map lock is only held to find the room's slot, so creating one room
    /// never waits on another room's title lookup.
    pub async fn get_or_create_session(&self, room_id: RoomId) -> Arc<Session> {
        let slot = {
            let mut sessions = self.sessions.lock().await;
            sessions.entry(room_id).or_default().clone()
        };

        slot.get_or_init(|| self.create_session(room_id))
            .await
            .clone()
    }

    /// Existing session of a room, without creating one
    pub async fn get_session(&self, room_id: RoomId) -> Option<Arc<Session>> {
        let sessions = self.sessions.lock().await;
        sessions.get(&room_id).and_then(|slot| slot.get().cloned())
    }

    /// Every live session, ordered by room id
    pub async fn sessions(&self) -> Vec<Arc<Session>> {
        let sessions = self.sessions.lock().await;
        let mut live: Vec<Arc<Session>> = sessions
            .values()
            .filter_map(|slot| slot.get().cloned())
            .collect();
        live.sort_by_key(|session| session.room_id());
        live
    }

    /// Hand an accepted socket to the room's session
    pub async fn connect<S, R>(
        &self,
        room_id: RoomId,
        sink: S,
        stream: R,
    ) -> Result<ConnectionId, SessionError>
    where
        S: SocketSink + 'static,
        R: SocketStream + 'static,
    {
        let session = self.get_or_create_session(room_id).await;
        start_connection(session, sink, stream, &self.config, &self.shutdown).await
    }

    async fn create_session(&self, room_id: RoomId) -> Arc<Session> {
        let title = match self.rooms.resolve_room_title(room_id).await {
            Ok(Some(title)) => title,
            Ok(None) => self.config.default_title.clone(),
            Err(e) => {
                tracing::warn!(
                    room_id = %room_id,
                    "Room directory failed, using default title: {}",
                    e
                );
                self.config.default_title.clone()
            }
        };

        tracing::info!(room_id = %room_id, title = %title, "Creating session");
        Session::spawn(
            room_id,
            title,
            self.users.clone(),
            self.clock.clone(),
            self.config.inbound_queue_capacity,
            &self.shutdown,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{DirectoryError, MockRoomDirectory},
        infrastructure::directory::InMemoryDirectory,
    };
    use uuid::Uuid;

    fn room(n: u128) -> RoomId {
        RoomId::new(Uuid::from_u128(n))
    }

    fn create_test_registry(rooms: MockRoomDirectory) -> Registry {
        Registry::new(
            ChatConfig::default(),
            Arc::new(InMemoryDirectory::new()),
            Arc::new(rooms),
        )
    }

    #[tokio::test]
    async fn test_same_room_resolves_to_same_session() {
        // テスト項目: 同じルーム ID を並行に参照しても生成は 1 回で、同じセッションが返る
        // given (前提条件):
        let mut rooms = MockRoomDirectory::new();
        rooms
            .expect_resolve_room_title()
            .times(1)
            .returning(|_| Ok(Some("Rustaceans Chat".to_string())));
        let registry = Arc::new(create_test_registry(rooms));

        // when (操作):
        let mut tasks = Vec::new();
        for _ in 0..16 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                registry.get_or_create_session(room(1)).await
            }));
        }
        let mut sessions = Vec::new();
        for task in tasks {
            sessions.push(task.await.unwrap());
        }

        // then (期待する結果):
        for session in &sessions[1..] {
            assert!(Arc::ptr_eq(&sessions[0], session));
        }
        assert_eq!(sessions[0].title(), "Rustaceans Chat");
        assert_eq!(registry.sessions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_different_rooms_get_different_sessions() {
        // テスト項目: 異なるルーム ID には別々のセッションが作られる
        // given (前提条件):
        let mut rooms = MockRoomDirectory::new();
        rooms.expect_resolve_room_title().returning(|_| Ok(None));
        let registry = create_test_registry(rooms);

        // when (操作):
        let second = registry.get_or_create_session(room(2)).await;
        let first = registry.get_or_create_session(room(1)).await;

        // then (期待する結果):
        assert!(!Arc::ptr_eq(&first, &second));
        let ids: Vec<RoomId> = registry
            .sessions()
            .await
            .iter()
            .map(|s| s.room_id())
            .collect();
        assert_eq!(ids, vec![room(1), room(2)]);
    }

    #[tokio::test]
    async fn test_unknown_room_gets_default_title() {
        // テスト項目: タイトルが見つからないルームはデフォルトタイトルになる
        // given (前提条件):
        let mut rooms = MockRoomDirectory::new();
        rooms.expect_resolve_room_title().returning(|_| Ok(None));
        let registry = create_test_registry(rooms);

        // when (操作):
        let session = registry.get_or_create_session(room(7)).await;

        // then (期待する結果):
        assert_eq!(session.title(), "Chat");
    }

    #[tokio::test]
    async fn test_directory_failure_still_creates_session() {
        // テスト項目: ルームディレクトリの障害時もセッション生成は失敗せずデフォルトタイトルになる
        // given (前提条件):
        let mut rooms = MockRoomDirectory::new();
        rooms
            .expect_resolve_room_title()
            .returning(|_| Err(DirectoryError::Unavailable("timeout".to_string())));
        let registry = create_test_registry(rooms);

        // when (操作):
        let session = registry.get_or_create_session(room(3)).await;

        // then (期待する結果):
        assert_eq!(session.title(), "Chat");
        assert_eq!(session.room_id(), room(3));
    }

    #[tokio::test]
    async fn test_get_session_does_not_create() {
        // テスト項目: get_session は存在しないルームのセッションを作らない
        // given (前提条件):
        let mut rooms = MockRoomDirectory::new();
        rooms.expect_resolve_room_title().times(0);
        let registry = create_test_registry(rooms);

        // when (操作):
        let found = registry.get_session(room(9)).await;

        // then (期待する結果):
        assert!(found.is_none());
        assert!(registry.sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_stops_every_broadcaster() {
        // テスト項目: レジストリのシャットダウンで全ルームのブロードキャスタが終了する
        // given (前提条件):
        let mut rooms = MockRoomDirectory::new();
        rooms.expect_resolve_room_title().returning(|_| Ok(None));
        let registry = create_test_registry(rooms);
        registry.get_or_create_session(room(1)).await;
        registry.get_or_create_session(room(2)).await;
        assert_eq!(registry.shutdown().active_tasks(), 2);

        // when (操作):
        let drained = registry
            .shutdown()
            .graceful_shutdown(std::time::Duration::from_secs(1))
            .await;

        // then (期待する結果):
        assert!(drained);
        assert_eq!(registry.shutdown().active_tasks(), 0);
    }
}
