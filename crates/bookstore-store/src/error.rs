//! Error types for bookstore storage.

use bookstore_core::BookstoreError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A record changed since it was read; the whole change set was rejected.
    #[error("write conflict on {key}")]
    Conflict {
        /// The record (or index slot) whose version did not match.
        key: String,
    },

    /// The change set itself is malformed.
    #[error("invalid write: {0}")]
    InvalidWrite(String),
}

impl StoreError {
    /// Whether retrying the whole unit of work may succeed.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<StoreError> for BookstoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(msg) => Self::Unavailable(msg),
            StoreError::Conflict { key } => {
                Self::Unavailable(format!("concurrent modification of {key}"))
            }
            StoreError::Serialization(msg) | StoreError::InvalidWrite(msg) => Self::Storage(msg),
        }
    }
}
