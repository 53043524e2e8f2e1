//! Transport-agnostic socket interface.
//!
//! A socket is handed to the chat core already split into its read half
//! (`SocketStream`) and write half (`SocketSink`). Only the outbound loop of a
//! connection pump ever owns the sink, which keeps exactly one writer per
//! socket. Deadlines are imposed by the pump, not by the halves.

use async_trait::async_trait;

use super::error::SocketError;

/// One message-framed unit on a socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Application payload (JSON text)
    Text(String),
    /// Keepalive probe
    Ping,
    /// Keepalive response
    Pong,
    /// Close handshake
    Close,
}

/// Read half of a socket
#[async_trait]
pub trait SocketStream: Send {
    /// Wait for the next frame; `None` once the peer is gone
    async fn recv(&mut self) -> Option<Result<Frame, SocketError>>;
}

/// Write half of a socket
#[async_trait]
pub trait SocketSink: Send {
    async fn send(&mut self, frame: Frame) -> Result<(), SocketError>;

    /// Flush and shut down the write side
    async fn close(&mut self) -> Result<(), SocketError>;
}
