//! Storage layer for the bookstore.
//!
//! This crate persists books, user profiles, purchases and payments, and
//! provides the one primitive the consistency core is built on: an atomic,
//! version-checked [`ChangeSet`] commit.
//!
//! # Backends
//!
//! - [`MemoryStore`]: process-local maps behind a lock (default).
//! - `RocksStore`: `RocksDB` with column families (feature `rocksdb-backend`).
//!
//! # Example
//!
//! ```
//! use bookstore_core::{User, UserId};
//! use bookstore_store::{ChangeSet, MemoryStore, Store};
//!
//! let store = MemoryStore::new();
//! let user_id = UserId::generate();
//! let mut user = User::new(user_id, "Ana", "ana@example.com").unwrap();
//! user.version = 1;
//!
//! let mut changes = ChangeSet::new();
//! changes.put(user);
//! store.commit(changes).unwrap();
//!
//! assert_eq!(store.get_user(&user_id).unwrap().unwrap().version, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod changeset;
pub mod error;
pub mod keys;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

#[cfg(test)]
mod conformance;

pub use changeset::{Change, ChangeSet, Record, RecordKey};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use bookstore_core::{Book, BookId, Payment, PaymentId, Purchase, PurchaseId, User, UserId};

/// The storage trait defining all database operations.
///
/// Reads are point-in-time and never block writers. All mutation goes
/// through [`Store::commit`].
pub trait Store: Send + Sync {
    // =========================================================================
    // Book Operations
    // =========================================================================

    /// Get a book by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_book(&self, book_id: &BookId) -> Result<Option<Book>>;

    /// List every book in the catalog, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_books(&self) -> Result<Vec<Book>>;

    // =========================================================================
    // User Operations
    // =========================================================================

    /// Get a user profile by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    // =========================================================================
    // Purchase Operations
    // =========================================================================

    /// Get a purchase by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_purchase(&self, purchase_id: &PurchaseId) -> Result<Option<Purchase>>;

    /// List a user's purchases, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_purchases_by_user(&self, user_id: &UserId) -> Result<Vec<Purchase>>;

    /// List the purchases of a book, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_purchases_by_book(&self, book_id: &BookId) -> Result<Vec<Purchase>>;

    // =========================================================================
    // Payment Operations
    // =========================================================================

    /// Get a payment by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_payment(&self, payment_id: &PaymentId) -> Result<Option<Payment>>;

    /// Get the payment of a purchase, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_payment_by_purchase(&self, purchase_id: &PurchaseId) -> Result<Option<Payment>>;

    // =========================================================================
    // Commit
    // =========================================================================

    /// Apply a change set atomically: every change or none.
    ///
    /// Secondary indexes follow the records they describe.
    ///
    /// # Errors
    ///
    /// - `StoreError::Conflict` if any version no longer matches (see [`ChangeSet`]).
    /// - `StoreError::InvalidWrite` if the change set is malformed.
    /// - `StoreError::Database` if the backend fails.
    fn commit(&self, changes: ChangeSet) -> Result<()>;
}
