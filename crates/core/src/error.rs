//! Data-layer error model.

use thiserror::Error;

/// Result type used by the data collaborator and route handlers.
pub type DomainResult<T> = Result<T, DomainError>;

/// Failures raised by the data layer, as opposed to the auth layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. missing field, bad pagination).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The requested resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The write would collide with an existing record.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store could not be read or written.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound(what)
    }
}
