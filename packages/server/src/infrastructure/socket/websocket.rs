//! axum WebSocket binding of the socket halves.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};

use crate::domain::{Frame, SocketError, SocketSink, SocketStream};

/// Read half of an upgraded WebSocket
pub struct WebSocketStream {
    inner: SplitStream<WebSocket>,
}

/// Write half of an upgraded WebSocket
pub struct WebSocketSink {
    inner: SplitSink<WebSocket, Message>,
}

/// Split an upgraded WebSocket into the halves the connection pump owns
pub fn split_websocket(socket: WebSocket) -> (WebSocketSink, WebSocketStream) {
    let (sink, stream) = socket.split();
    (
        WebSocketSink { inner: sink },
        WebSocketStream { inner: stream },
    )
}

#[async_trait]
impl SocketStream for WebSocketStream {
    async fn recv(&mut self) -> Option<Result<Frame, SocketError>> {
        loop {
            let message = match self.inner.next().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(SocketError::Transport(e.to_string()))),
            };

            let frame = match message {
                Message::Text(text) => Frame::Text(text.as_str().to_owned()),
                // Some mobile clients send JSON as binary frames
                Message::Binary(data) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => Frame::Text(text),
                    Err(_) => {
                        tracing::debug!(len = data.len(), "Dropping non-UTF-8 binary frame");
                        continue;
                    }
                },
                Message::Ping(_) => Frame::Ping,
                Message::Pong(_) => Frame::Pong,
                Message::Close(_) => Frame::Close,
            };
            return Some(Ok(frame));
        }
    }
}

#[async_trait]
impl SocketSink for WebSocketSink {
    async fn send(&mut self, frame: Frame) -> Result<(), SocketError> {
        let message = match frame {
            Frame::Text(text) => Message::Text(text.into()),
            Frame::Ping => Message::Ping(Default::default()),
            Frame::Pong => Message::Pong(Default::default()),
            Frame::Close => Message::Close(None),
        };
        self.inner
            .send(message)
            .await
            .map_err(|e| SocketError::Transport(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.inner
            .close()
            .await
            .map_err(|e| SocketError::Transport(e.to_string()))
    }
}
