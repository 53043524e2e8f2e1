//! Domain layer: identifiers, the chat message model, bounded history and the
//! interfaces the chat core consumes (sockets and directories).
//!
//! Nothing in here knows about axum or JSON; the infrastructure layer adapts
//! concrete transports and stores to these types.

pub mod directory;
pub mod error;
pub mod history;
pub mod message;
pub mod socket;
pub mod value_object;

pub use directory::{RoomDirectory, UserDirectory, UserProfile};
#[cfg(test)]
pub use directory::{MockRoomDirectory, MockUserDirectory};
pub use error::{DirectoryError, DomainError, SocketError};
pub use history::{HISTORY_CAPACITY, History};
pub use message::{ChatMessage, MessageBody, MessageKind};
pub use socket::{Frame, SocketSink, SocketStream};
pub use value_object::{ConnectionId, RoomId, UserId};
