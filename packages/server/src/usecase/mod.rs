//! UseCase layer: the room registry, per-room sessions with their broadcaster,
//! and the per-connection pumps.

pub mod error;
pub mod pump;
pub mod registry;
pub mod session;

pub use error::SessionError;
pub use pump::start_connection;
pub use registry::Registry;
pub use session::{ConnectionHandle, Envelope, Outbound, Session};
