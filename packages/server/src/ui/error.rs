//! UI 層のエラー定義

use thiserror::Error;

use crate::{config::ConfigError, domain::DirectoryError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to load directory: {0}")]
    Directory(#[from] DirectoryError),
}
