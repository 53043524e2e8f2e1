//! UI layer: the axum router, WebSocket and HTTP handlers, and the server
//! lifecycle.

pub mod error;
mod handler;
mod server;
mod signal;
pub mod state;

pub use error::ServerError;
pub use server::Server;
pub use signal::shutdown_signal;
