//! # Store Errors
//!
//! Error types for the document store.

use std::io;

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A transaction precondition failed: the document changed (or appeared,
    /// or vanished) after the transaction read it.
    #[error("Commit conflict on {collection}/{id}")]
    Conflict { collection: String, id: String },

    /// An update targeted a document that does not exist
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// Optimistic retries exhausted
    #[error("Transaction aborted after {attempts} attempts")]
    TransactionAborted { attempts: u32 },

    /// A transaction read after it had already staged writes
    #[error("Transaction reads must happen before writes")]
    ReadAfterWrite,

    /// A stored document does not have the expected shape
    #[error("Malformed document {collection}/{id}: {reason}")]
    MalformedDocument {
        collection: String,
        id: String,
        reason: String,
    },

    /// Internal lock poisoned or backend otherwise unusable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Snapshot file could not be read, written or verified
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Underlying filesystem failure
    #[error("Store I/O error: {0}")]
    Io(#[from] io::Error),

    /// Store configuration could not be parsed or is out of range
    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    pub(crate) fn conflict(collection: &str, id: &str) -> Self {
        StoreError::Conflict {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn malformed(collection: &str, id: &str, reason: impl Into<String>) -> Self {
        StoreError::MalformedDocument {
            collection: collection.to_string(),
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn lock_poisoned() -> Self {
        StoreError::Unavailable("Lock poisoned".to_string())
    }

    /// Only a lost optimistic race is worth running the transaction again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflict_is_retryable() {
        assert!(StoreError::conflict("products", "P1").is_retryable());
        assert!(!StoreError::not_found("products", "P1").is_retryable());
        assert!(!StoreError::TransactionAborted { attempts: 5 }.is_retryable());
        assert!(!StoreError::lock_poisoned().is_retryable());
    }

    #[test]
    fn test_messages_name_the_document() {
        let err = StoreError::malformed("products", "P9", "quantity is not an integer");
        let message = err.to_string();
        assert!(message.contains("products/P9"));
        assert!(message.contains("quantity is not an integer"));
    }
}
