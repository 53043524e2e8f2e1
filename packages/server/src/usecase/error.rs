//! UseCase 層のエラー定義

use thiserror::Error;

use crate::infrastructure::dto::WireError;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The session's broadcaster is gone
    #[error("session inbound queue is closed")]
    QueueClosed,

    /// Shutdown was observed while waiting
    #[error("cancelled by shutdown")]
    Cancelled,

    /// The connection's outbound queue could not accept the initial snapshot
    #[error("connection outbound queue is closed or full")]
    ConnectionGone,

    #[error("failed to encode message: {0}")]
    Encode(#[from] WireError),
}
