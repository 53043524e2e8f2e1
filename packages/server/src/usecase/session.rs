//! UseCase: チャットルームのセッション
//!
//! A `Session` is the broadcast hub of one room. Connection pumps push decoded
//! messages into its bounded inbound queue; a single broadcaster task drains
//! the queue, decides what each message does to the room history, and fans the
//! result out to the outbound queues of the joined connections. The
//! broadcaster never touches a socket.
//!
//! Connections go through two stages:
//!
//! - attached: the history snapshot was queued, but the connection has not
//!   joined yet and receives no fan-out;
//! - joined: a valid `join` promoted it into `clients`.

use std::{collections::HashMap, sync::Arc};

use clubchat_shared::time::Clock;
use tokio::sync::{
    Mutex,
    mpsc::{self, error::TrySendError},
};
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{ChatMessage, ConnectionId, History, MessageBody, RoomId, UserDirectory, UserId},
    infrastructure::dto::{encode_message, encode_with_nickname},
    shutdown::ShutdownCoordinator,
};

use super::error::SessionError;

/// Name used when a user has no usable display name
pub const ANONYMOUS: &str = "Anonymous";

const INVALID_USER_FORMAT: &str = "Invalid user ID format";
const USER_NOT_FOUND: &str = "User does not exist";

/// Item of a connection's outbound queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Encoded frame to write
    Text(String),
    /// Close the connection once everything before it was written
    Close,
}

/// A message accepted from one connection
#[derive(Debug, Clone)]
pub struct Envelope {
    pub from: ConnectionId,
    pub message: ChatMessage,
}

/// The session's handle on one connection: its outbound queue and the token
/// that tears the connection down.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbox: mpsc::Sender<Outbound>,
    closer: CancellationToken,
}

impl ConnectionHandle {
    /// Create a handle plus the receiving end of its outbound queue
    pub fn new(capacity: usize, closer: CancellationToken) -> (Self, mpsc::Receiver<Outbound>) {
        let (outbox, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                id: ConnectionId::generate(),
                outbox,
                closer,
            },
            rx,
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a frame without waiting; fails when the queue is full or closed
    fn push(&self, frame: String) -> Result<(), TrySendError<Outbound>> {
        self.outbox.try_send(Outbound::Text(frame))
    }

    /// Queue a last frame followed by a close request.
    ///
    /// Falls back to cancelling the connection when the queue cannot take them.
    fn finish(&self, last: String) {
        let queued = self.push(last).is_ok() && self.outbox.try_send(Outbound::Close).is_ok();
        if !queued {
            self.closer.cancel();
        }
    }

    fn abort(&self) {
        self.closer.cancel();
    }
}

#[derive(Debug)]
struct JoinedClient {
    handle: ConnectionHandle,
    user_id: UserId,
}

#[derive(Debug, Default)]
struct SessionState {
    clients: HashMap<ConnectionId, JoinedClient>,
    pending: HashMap<ConnectionId, ConnectionHandle>,
    history: History,
}

impl SessionState {
    /// Write one frame to every joined connection.
    ///
    /// Connections whose queue refuses the frame are dropped and closed; the
    /// others still get it. Returns the number of successful deliveries.
    fn fan_out(&mut self, room_id: RoomId, frame: &str) -> usize {
        let mut failed = Vec::new();
        for (id, client) in &self.clients {
            if let Err(e) = client.handle.push(frame.to_string()) {
                tracing::warn!(
                    room_id = %room_id,
                    connection_id = %id,
                    "Dropping connection, outbound queue rejected frame: {}",
                    e
                );
                failed.push(*id);
            }
        }

        for id in &failed {
            if let Some(client) = self.clients.remove(id) {
                client.handle.abort();
            }
        }
        self.clients.len()
    }

    /// Take a connection out of either stage
    fn take(&mut self, id: &ConnectionId) -> Option<ConnectionHandle> {
        self.pending
            .remove(id)
            .or_else(|| self.clients.remove(id).map(|client| client.handle))
    }
}

/// Broadcast hub of one chat room
pub struct Session {
    room_id: RoomId,
    title: String,
    inbox: mpsc::Sender<Envelope>,
    state: Mutex<SessionState>,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
}

impl Session {
    /// Create a session and the receiving end of its inbound queue.
    ///
    /// The caller is responsible for running the broadcaster; see [`Session::spawn`].
    pub fn new(
        room_id: RoomId,
        title: impl Into<String>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        queue_capacity: usize,
    ) -> (Self, mpsc::Receiver<Envelope>) {
        let (inbox, rx) = mpsc::channel(queue_capacity.max(1));
        let session = Self {
            room_id,
            title: title.into(),
            inbox,
            state: Mutex::new(SessionState::default()),
            users,
            clock,
        };
        (session, rx)
    }

    /// Create a session and start its broadcaster on the coordinator
    pub fn spawn(
        room_id: RoomId,
        title: impl Into<String>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        queue_capacity: usize,
        shutdown: &ShutdownCoordinator,
    ) -> Arc<Self> {
        let (session, inbox) = Self::new(room_id, title, users, clock, queue_capacity);
        let session = Arc::new(session);
        shutdown.spawn(session.clone().run(inbox, shutdown.token()));
        session
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Accept a new connection: queue the history snapshot to it alone and
    /// register it as attached (not yet joined).
    ///
    /// Holds the state lock across both steps, so no broadcast can slip in
    /// between the snapshot and the registration.
    pub async fn attach(&self, handle: ConnectionHandle) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        let snapshot = ChatMessage::history(self.title.clone(), state.history.snapshot())
            .with_timestamp(self.clock.now());
        let frame = encode_message(&snapshot)?;
        handle
            .push(frame)
            .map_err(|_| SessionError::ConnectionGone)?;

        tracing::debug!(
            room_id = %self.room_id,
            connection_id = %handle.id,
            history = state.history.len(),
            "Sent history snapshot"
        );
        state.pending.insert(handle.id, handle);
        Ok(())
    }

    /// Forget a connection. Returns whether it was known.
    pub async fn detach(&self, id: ConnectionId) -> bool {
        let mut state = self.state.lock().await;
        let removed = state.take(&id).is_some();
        if removed {
            tracing::info!(
                room_id = %self.room_id,
                connection_id = %id,
                clients = state.clients.len(),
                "Connection left the room"
            );
        }
        removed
    }

    /// Push a message into the inbound queue, waiting while it is full
    pub async fn submit(&self, from: ConnectionId, message: ChatMessage) -> Result<(), SessionError> {
        self.inbox
            .send(Envelope { from, message })
            .await
            .map_err(|_| SessionError::QueueClosed)
    }

    /// Number of joined connections
    pub async fn client_count(&self) -> usize {
        self.state.lock().await.clients.len()
    }

    /// Number of attached connections that have not joined
    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// User ids of joined connections, sorted
    pub async fn members(&self) -> Vec<UserId> {
        let state = self.state.lock().await;
        let mut members: Vec<UserId> = state.clients.values().map(|c| c.user_id).collect();
        members.sort();
        members
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        self.state.lock().await.history.snapshot()
    }

    pub async fn history_len(&self) -> usize {
        self.state.lock().await.history.len()
    }

    /// Broadcaster loop: the only consumer of the inbound queue
    pub async fn run(
        self: Arc<Self>,
        mut inbox: mpsc::Receiver<Envelope>,
        shutdown: CancellationToken,
    ) {
        tracing::info!(room_id = %self.room_id, title = %self.title, "Broadcaster started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                envelope = inbox.recv() => match envelope {
                    Some(envelope) => self.dispatch(envelope).await,
                    None => break,
                },
            }
        }

        let mut state = self.state.lock().await;
        for handle in state.pending.values() {
            handle.abort();
        }
        for client in state.clients.values() {
            client.handle.abort();
        }
        state.pending.clear();
        state.clients.clear();
        tracing::info!(room_id = %self.room_id, "Broadcaster stopped");
    }

    /// Apply one accepted message to the room
    pub(crate) async fn dispatch(&self, envelope: Envelope) {
        let Envelope { from, mut message } = envelope;
        message.timestamp = Some(self.clock.now());
        tracing::debug!(
            room_id = %self.room_id,
            connection_id = %from,
            kind = message.kind_name(),
            "Dispatching message"
        );

        match message.body {
            MessageBody::Join { ref user_id } => {
                let user_id = user_id.clone();
                self.handle_join(from, &user_id).await;
            }
            MessageBody::Chat { .. } => self.handle_chat(message).await,
            MessageBody::System { .. }
            | MessageBody::Error { .. }
            | MessageBody::History { .. }
            | MessageBody::Other { .. } => self.forward(message).await,
        }
    }

    async fn handle_join(&self, from: ConnectionId, raw_user_id: &str) {
        let Ok(user_id) = UserId::try_from(raw_user_id) else {
            tracing::warn!(
                room_id = %self.room_id,
                connection_id = %from,
                user_id = raw_user_id,
                "Rejecting join with malformed user id"
            );
            self.reject(from, INVALID_USER_FORMAT).await;
            return;
        };

        let profile = match self.users.resolve_user(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::warn!(
                    room_id = %self.room_id,
                    connection_id = %from,
                    user_id = %user_id,
                    "Rejecting join from unknown user"
                );
                self.reject(from, USER_NOT_FOUND).await;
                return;
            }
            Err(e) => {
                tracing::warn!(
                    room_id = %self.room_id,
                    connection_id = %from,
                    user_id = %user_id,
                    "User directory failed, rejecting join: {}",
                    e
                );
                self.reject(from, USER_NOT_FOUND).await;
                return;
            }
        };

        let name = profile.display_name().unwrap_or(ANONYMOUS);
        let notice = ChatMessage::system(self.room_id, format!("{} joined the chat", name))
            .with_timestamp(self.clock.now());
        let frame = match encode_message(&notice) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(room_id = %self.room_id, "Failed to encode join notice: {}", e);
                return;
            }
        };

        let mut state = self.state.lock().await;
        let Some(handle) = state.take(&from) else {
            tracing::debug!(
                room_id = %self.room_id,
                connection_id = %from,
                "Join from a connection that already left"
            );
            return;
        };
        state.clients.insert(from, JoinedClient { handle, user_id });
        state.history.push(notice);
        let delivered = state.fan_out(self.room_id, &frame);
        tracing::info!(
            room_id = %self.room_id,
            connection_id = %from,
            user_id = %user_id,
            delivered,
            "{} joined the chat",
            name
        );
    }

    /// Send an error to one connection and close it; the room is untouched
    /// unless the connection had joined before.
    async fn reject(&self, from: ConnectionId, text: &str) {
        let error = ChatMessage::error(text).with_timestamp(self.clock.now());
        let mut state = self.state.lock().await;
        let Some(handle) = state.take(&from) else {
            return;
        };
        match encode_message(&error) {
            Ok(frame) => handle.finish(frame),
            Err(e) => {
                tracing::error!(room_id = %self.room_id, "Failed to encode error frame: {}", e);
                handle.abort();
            }
        }
    }

    async fn handle_chat(&self, mut message: ChatMessage) {
        let nickname = self.resolve_nickname(message.user_id().unwrap_or_default()).await;
        message.chat_id = Some(self.room_id);
        let frame = match encode_with_nickname(&message, &nickname) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(room_id = %self.room_id, "Failed to encode chat message: {}", e);
                return;
            }
        };

        let mut state = self.state.lock().await;
        state.history.push(message);
        let delivered = state.fan_out(self.room_id, &frame);
        tracing::debug!(room_id = %self.room_id, nickname = %nickname, delivered, "Broadcast chat message");
    }

    async fn forward(&self, message: ChatMessage) {
        let frame = match encode_message(&message) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(room_id = %self.room_id, "Failed to encode message: {}", e);
                return;
            }
        };

        let mut state = self.state.lock().await;
        let delivered = state.fan_out(self.room_id, &frame);
        tracing::debug!(
            room_id = %self.room_id,
            kind = message.kind_name(),
            delivered,
            "Forwarded message"
        );
    }

    async fn resolve_nickname(&self, raw_user_id: &str) -> String {
        let Ok(user_id) = UserId::try_from(raw_user_id) else {
            return ANONYMOUS.to_string();
        };
        match self.users.resolve_user(user_id).await {
            Ok(Some(profile)) => profile
                .display_name()
                .unwrap_or(ANONYMOUS)
                .to_string(),
            Ok(None) => ANONYMOUS.to_string(),
            Err(e) => {
                tracing::warn!(user_id = %user_id, "User directory failed: {}", e);
                ANONYMOUS.to_string()
            }
        }
    }
}
