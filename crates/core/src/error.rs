//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures. Transport
/// and infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input, missing field).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A unique-name constraint was violated on create/rename.
    #[error("duplicate name: '{0}'")]
    DuplicateName(String),

    /// A referenced foreign id (e.g. a permission id in an assignment list)
    /// does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// The requested entity does not exist.
    #[error("not found")]
    NotFound,

    /// A policy check denied the action.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName(name.into())
    }

    pub fn invalid_reference(msg: impl Into<String>) -> Self {
        Self::InvalidReference(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}
