//! Unified error type for the vodforge engine.
//!
//! All crates funnel their failures into [`Error`]. The resolver's default
//! posture is "degrade to fewer sources, never throw": most failures are
//! logged and swallowed at the call site, and only configuration errors
//! (an unknown profile key referenced from the enabled set) propagate back
//! to the caller of a resolution.

use std::fmt;

/// Unified error type covering all failure modes in vodforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "profile", "job").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The supplied configuration is invalid (e.g. an enabled transcode key
    /// with no catalog entry). Fatal to the resolution that hit it.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The job queue collaborator rejected a submission.
    #[error("Queue error: {0}")]
    Queue(String),

    /// A remote repository query failed or returned malformed data.
    #[error("Remote error: {0}")]
    Remote(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Queue`].
    pub fn queue(message: impl Into<String>) -> Self {
        Error::Queue(message.into())
    }

    /// Convenience constructor for [`Error::Remote`].
    pub fn remote(message: impl Into<String>) -> Self {
        Error::Remote(message.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
