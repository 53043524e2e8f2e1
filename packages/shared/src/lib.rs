//! Utilities shared by the clubchat server and client binaries.

pub mod logger;
pub mod time;
