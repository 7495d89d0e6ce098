//! Unified error types and result handling for `PartDesk`.
//!
//! Read paths degrade gracefully: callers catch `Remote` variants, log them,
//! and fall back to empty results. Primary write paths (submit, approve,
//! reject, override updates) propagate errors to the caller. Best-effort
//! bookkeeping (image re-homing, stale blob cleanup) is logged and swallowed
//! at the call site and never reaches this type's consumers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A required field was missing or empty before a mutating operation.
    /// Raised before any remote call is made.
    #[error("Missing required field: {field}")]
    Validation { field: String },

    /// A document-store or blob-store call failed.
    #[error("Remote store error: {message}")]
    Remote { message: String },

    /// The requested record does not exist.
    #[error("Record not found: {id}")]
    NotFound { id: String },

    /// The record is not in a state that permits the requested transition.
    #[error("Application {id} is {status}, expected pending")]
    InvalidTransition { id: String, status: String },

    /// Configuration file or environment problem.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// PDF assembly failed.
    #[error("Render error: {message}")]
    Render { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Remote {
            message: value.to_string(),
        }
    }
}

impl Error {
    /// Shorthand for a validation failure naming the offending field.
    pub fn missing(field: &str) -> Self {
        Error::Validation {
            field: field.to_string(),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Error::Remote {
            message: message.into(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
