//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures. Infrastructure
/// concerns (storage, publication) belong to the infra crate's error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The actor is not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A required field is missing or malformed, or the operation does not apply
    /// to this kind of transaction.
    #[error("invalid input{}: {}", field_suffix(.field), .message)]
    InvalidInput {
        field: Option<String>,
        message: String,
    },

    /// Unknown transaction id or invitation token.
    #[error("not found: {0}")]
    NotFound(String),

    /// The target is not in a state that allows the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The invitation is past its expiry.
    #[error("invitation has expired")]
    Expired,

    /// A concurrent writer committed first (stale version).
    #[error("conflict: {0}")]
    Conflict(String),
}

fn field_suffix(field: &Option<String>) -> String {
    field.as_deref().map(|f| format!(" ({f})")).unwrap_or_default()
}

impl DomainError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Invalid input not tied to a single field.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: None,
            message: msg.into(),
        }
    }

    /// Invalid input naming the offending field.
    pub fn invalid_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: Some(field.into()),
            message: msg.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Field named by an `InvalidInput` error, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidInput { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}
