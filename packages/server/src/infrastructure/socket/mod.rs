//! Socket implementations
//!
//! - `websocket`: axum WebSocket halves
//! - `memory`: channel-backed socket driven by unit tests

#[cfg(test)]
pub mod memory;
pub mod websocket;

#[cfg(test)]
pub use memory::{ChannelPeer, ChannelSink, ChannelStream, channel_socket};
pub use websocket::{WebSocketSink, WebSocketStream, split_websocket};
