//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server refused the upgrade (missing or malformed chat id)
    #[error("Server rejected the connection: {0}")]
    BadRequest(String),

    /// The server answered the join with an error frame
    #[error("Join rejected: {0}")]
    JoinRejected(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}
