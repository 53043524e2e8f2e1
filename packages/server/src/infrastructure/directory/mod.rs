//! Directory implementations
//!
//! - `inmemory`: users and clubs held in memory, optionally loaded from JSON

pub mod inmemory;

pub use inmemory::{DirectoryFixture, InMemoryDirectory};
