//! Channel-backed socket.
//!
//! The chat core sees an ordinary `SocketStream`/`SocketSink` pair; the test
//! (or embedding code) drives the other end through `ChannelPeer`.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{Frame, SocketError, SocketSink, SocketStream};

/// Read half fed by the peer
pub struct ChannelStream {
    rx: mpsc::UnboundedReceiver<Result<Frame, SocketError>>,
}

/// Write half delivering to the peer
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Frame>,
    broken: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

/// The remote end of a channel socket
pub struct ChannelPeer {
    to_server: mpsc::UnboundedSender<Result<Frame, SocketError>>,
    from_server: mpsc::UnboundedReceiver<Frame>,
    broken: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

/// Create a connected sink/stream pair and the peer driving it
pub fn channel_socket() -> (ChannelSink, ChannelStream, ChannelPeer) {
    let (to_server, rx) = mpsc::unbounded_channel();
    let (tx, from_server) = mpsc::unbounded_channel();
    let broken = Arc::new(AtomicBool::new(false));
    let closed = Arc::new(AtomicBool::new(false));

    (
        ChannelSink {
            tx,
            broken: broken.clone(),
            closed: closed.clone(),
        },
        ChannelStream { rx },
        ChannelPeer {
            to_server,
            from_server,
            broken,
            closed,
        },
    )
}

#[async_trait]
impl SocketStream for ChannelStream {
    async fn recv(&mut self) -> Option<Result<Frame, SocketError>> {
        self.rx.recv().await
    }
}

#[async_trait]
impl SocketSink for ChannelSink {
    async fn send(&mut self, frame: Frame) -> Result<(), SocketError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(SocketError::Transport("broken pipe".to_string()));
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(SocketError::Closed);
        }
        self.tx.send(frame).map_err(|_| SocketError::Closed)
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl ChannelPeer {
    /// Deliver a frame to the server side
    pub fn send(&self, frame: Frame) -> bool {
        self.to_server.send(Ok(frame)).is_ok()
    }

    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.send(Frame::Text(text.into()))
    }

    /// Make the server side's next reads fail with a transport error
    pub fn fail_reads(&self) -> bool {
        self.to_server
            .send(Err(SocketError::Transport("connection reset".to_string())))
            .is_ok()
    }

    /// Make every subsequent server write fail
    pub fn break_writes(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    /// Next frame written by the server; `None` once the sink is gone
    pub async fn recv(&mut self) -> Option<Frame> {
        self.from_server.recv().await
    }

    /// Next text frame written by the server, skipping keepalive frames
    pub async fn recv_text(&mut self) -> Option<String> {
        loop {
            match self.from_server.recv().await? {
                Frame::Text(text) => return Some(text),
                Frame::Ping | Frame::Pong => continue,
                Frame::Close => return None,
            }
        }
    }

    /// Whether the server side closed its write half
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        // テスト項目: ピアとサーバー側の間でフレームが双方向に届く
        // given (前提条件):
        let (mut sink, mut stream, mut peer) = channel_socket();

        // when (操作):
        peer.send_text("from peer");
        sink.send(Frame::Text("from server".to_string())).await.unwrap();

        // then (期待する結果):
        assert_eq!(
            stream.recv().await,
            Some(Ok(Frame::Text("from peer".to_string())))
        );
        assert_eq!(peer.recv_text().await, Some("from server".to_string()));
    }

    #[tokio::test]
    async fn test_broken_sink_rejects_writes() {
        // テスト項目: break_writes 後の書き込みはトランスポートエラーになる
        // given (前提条件):
        let (mut sink, _stream, peer) = channel_socket();

        // when (操作):
        peer.break_writes();
        let result = sink.send(Frame::Ping).await;

        // then (期待する結果):
        assert!(matches!(result, Err(SocketError::Transport(_))));
    }

    #[tokio::test]
    async fn test_close_is_visible_to_peer() {
        // テスト項目: サーバー側のクローズがピアから観測できる
        // given (前提条件):
        let (mut sink, _stream, peer) = channel_socket();

        // when (操作):
        sink.close().await.unwrap();

        // then (期待する結果):
        assert!(peer.is_closed());
        assert_eq!(sink.send(Frame::Ping).await, Err(SocketError::Closed));
    }
}
