//! Error types for the bookstore.

use crate::ids::IdError;

/// Result type for bookstore operations.
pub type Result<T> = std::result::Result<T, BookstoreError>;

/// Errors that can occur in bookstore operations.
///
/// A record that exists but belongs to another user is reported as
/// [`BookstoreError::NotFound`], exactly like a missing one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookstoreError {
    /// Entity absent or not owned by the caller.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record ("book", "purchase", ...).
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Requested quantity exceeds the stock on the shelf.
    #[error("insufficient stock for book {book_id}: available={available}, requested={requested}")]
    InsufficientStock {
        /// The book whose stock is too low.
        book_id: String,
        /// Units currently on the shelf.
        available: u32,
        /// Units requested.
        requested: u32,
    },

    /// The current status of a purchase or payment forbids the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Settlement declined the payment.
    #[error("payment declined: {reason}")]
    PaymentDeclined {
        /// Reason reported by the settlement provider.
        reason: String,
    },

    /// A record with the same identity already exists.
    #[error("{entity} already exists: {id}")]
    AlreadyExists {
        /// Kind of record.
        entity: &'static str,
        /// Conflicting identifier.
        id: String,
    },

    /// The persistence layer is unavailable or too contended; retry later.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be read back.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

impl BookstoreError {
    /// Shorthand for [`BookstoreError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
