//! vf-core: shared types, IDs, errors, and configuration.
//!
//! This crate is the foundational dependency for the vodforge engine and
//! the vf-db persistence crate, providing type-safe identifiers, a unified
//! error type, media-domain types (codec families, encode size bounds),
//! and the engine configuration.

pub mod config;
pub mod error;
pub mod ids;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use ids::*;
pub use media::*;
