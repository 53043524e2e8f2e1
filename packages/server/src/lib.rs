//! Real-time chat core of the club application.
//!
//! - `domain`: identifiers, the chat message model, history and the
//!   socket/directory interfaces
//! - `usecase`: room registry, per-room sessions and connection pumps
//! - `infrastructure`: wire codec, socket bindings, in-memory directories
//! - `ui`: axum router and server lifecycle

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shutdown;
pub mod ui;
pub mod usecase;
