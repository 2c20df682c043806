//! Contract error types for the data core
//!
//! These errors are transport-agnostic; mapping to user-visible responses is
//! the calling layer's responsibility. Not-found is expressed as `None` by
//! the read operations, never as an error.

use thiserror::Error;

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Data-access error taxonomy
#[derive(Debug, Error)]
pub enum Error {
    /// Field-scoped validation failure, raised before any store mutation
    #[error("Validation failed on '{field}': {message}")]
    Validation {
        /// Offending field name
        field: String,
        /// Human-readable message
        message: String,
    },

    /// Constraint violation (e.g. unique-key clash) surfaced by an entity
    /// repository's business rules
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store/connectivity failure, propagated verbatim; no retry, no backoff
    #[error(transparent)]
    Store(#[from] sea_orm::DbErr),

    /// Record failed to round-trip through its JSON representation
    #[error(transparent)]
    Codec(#[from] serde_json::Error),

    /// Invariant breach inside the engine itself
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a validation error for `field`
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether this error was raised by the sanitize/validate pipeline
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
