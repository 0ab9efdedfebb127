//! Error types for userstore.

use std::fmt;

use thiserror::Error;

/// Storage operation in which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    FindOne,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Create => "create",
            Operation::FindOne => "find_one",
            Operation::Update => "update",
            Operation::Delete => "delete",
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid identifier {id:?}: {reason}")]
    InvalidIdentifier { id: String, reason: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Storage failure during {operation} of {id}: {message}")]
    Storage {
        operation: Operation,
        id: String,
        message: String,
    },

    #[error("Failed to encode record during {operation}: {message}")]
    Encoding { operation: Operation, message: String },

    #[error("Failed to decode record {id} during {operation}: {message}")]
    Decoding {
        operation: Operation,
        id: String,
        message: String,
    },

    #[error("Operation {operation} was cancelled")]
    Cancelled { operation: Operation },
}

impl StoreError {
    /// Whether a caller may reasonably retry the same call.
    ///
    /// Only backend failures and cancellations qualify; identifier,
    /// absence and serialization errors will repeat deterministically.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Storage { .. } | StoreError::Cancelled { .. }
        )
    }

    /// Whether the error signals a mismatch between the entity model and
    /// its persisted representation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StoreError::Encoding { .. } | StoreError::Decoding { .. }
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
