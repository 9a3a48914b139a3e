//! Error types for the store contract.

use std::io;

/// Errors surfaced by any store implementation.
///
/// The taxonomy is part of the contract: callers branch on the variant
/// (e.g. an HTTP layer maps `NotFound` to a missing-resource response and
/// everything else to a server-side failure) and never on message text.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The requested model, model version, result, or result version does
    /// not exist.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// The caller supplied something the contract rejects: a malformed
    /// store URI, an unrecognized scheme, or a write payload that does not
    /// contain exactly one new version.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The storage medium is unreachable or inconsistent.
    #[error("storage medium failure: {message}")]
    Medium {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// An invariant the engine maintains was observed broken. This signals
    /// a defect in the engine, not a caller error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl StoreError {
    pub fn not_found(message: impl Into<String>) -> Self {
        StoreError::NotFound {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        StoreError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn medium(message: impl Into<String>, source: io::Error) -> Self {
        StoreError::Medium {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn medium_inconsistent(message: impl Into<String>) -> Self {
        StoreError::Medium {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        StoreError::Internal {
            message: message.into(),
        }
    }
}
