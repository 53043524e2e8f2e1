//! Domain error types.

use thiserror::Error;

/// Errors raised while constructing domain values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Room identifier is not a UUID
    #[error("Invalid room id '{0}'")]
    InvalidRoomId(String),

    /// User identifier is not a positive integer
    #[error("Invalid user id '{0}'")]
    InvalidUserId(String),
}

/// Errors reported by a socket half
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SocketError {
    /// The peer or the local side already closed the connection
    #[error("socket closed")]
    Closed,

    /// A read or write did not complete within its deadline
    #[error("socket operation timed out")]
    Timeout,

    /// Underlying transport failure
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors reported by the user and room directories
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// The backing store could not be reached or read
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    /// The directory fixture could not be parsed
    #[error("invalid directory data: {0}")]
    InvalidData(String),
}
