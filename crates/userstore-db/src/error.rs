//! Database-specific error types and conversions.

use userstore_core::error::{Operation, StoreError};

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Invalid table name {0:?}")]
    InvalidTable(String),
}

impl DbError {
    /// Surface the error to callers of the storage contract, tagged with
    /// the operation and the record it targeted.
    pub fn into_store_error(self, operation: Operation, id: impl Into<String>) -> StoreError {
        StoreError::Storage {
            operation,
            id: id.into(),
            message: self.to_string(),
        }
    }
}
