//! Errors shared across the domain model and repository layer.

use thiserror::Error;

/// Errors raised while constructing or validating a value object.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} exceeds maximum length of {max}")]
    TooLong { field: &'static str, max: usize },
}

/// Result alias for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors a repository implementation may return. These are intentionally
/// coarse: callers only ever need to distinguish "not found" from "anything
/// else went wrong" (which the service layer maps to `Internal`).
#[derive(Debug, Clone, Error)]
pub enum RepoError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}
