//! Data Transfer Objects (DTOs) for the chat application.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs
//! - `http`: HTTP API response DTOs
//!
//! `conversion` maps them to and from the domain model.

pub mod conversion;
pub mod http;
pub mod websocket;

pub use conversion::{decode_message, encode_message, encode_with_nickname};
pub use websocket::{WireError, WireMessage};
