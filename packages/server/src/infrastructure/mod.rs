//! Infrastructure layer: wire format, concrete socket binding and the
//! in-memory collaborators.

pub mod directory;
pub mod dto;
pub mod socket;
