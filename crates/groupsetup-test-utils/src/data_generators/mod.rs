//! Test data generators for the Group Setup engine.
//!
//! Entities, contacts and step payloads that pass the standard step modules'
//! validation.

mod entities;
mod payloads;

pub use entities::*;
pub use payloads::*;
