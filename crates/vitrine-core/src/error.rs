//! Unified error type for the vitrine application.
//!
//! All crates funnel their failures into [`Error`], which carries enough context
//! for HTTP handlers to derive a status code via [`Error::http_status`] and a
//! client-safe message via [`Error::public_message`].

use std::fmt;

/// Unified error type covering all failure modes in vitrine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested record could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "image").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A required field or file was missing from the request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An uploaded image could not be decoded, resized or encoded.
    #[error("Processing error: {0}")]
    Processing(String),

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

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::Processing(_) => 500,
            Error::Database { .. } => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Message that is safe to show to an end user.
    ///
    /// Validation messages are returned as-is; everything else collapses to
    /// a generic line so that paths, SQL and decoder output stay server-side.
    pub fn public_message(&self) -> String {
        match self {
            Error::Validation(msg) => msg.clone(),
            Error::NotFound { .. } => "Not found.".into(),
            Error::Processing(_) => "The image could not be processed.".into(),
            Error::Database { .. } | Error::Io { .. } | Error::Internal(_) => {
                "Something went wrong while handling the request.".into()
            }
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Processing`].
    pub fn processing(message: impl fmt::Display) -> Self {
        Error::Processing(message.to_string())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
