//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Catalog entries, keyed by `book_id` (ULID).
    pub const BOOKS: &str = "books";

    /// User profiles, keyed by `user_id`.
    pub const USERS: &str = "users";

    /// Purchases, keyed by `purchase_id` (ULID).
    pub const PURCHASES: &str = "purchases";

    /// Payments, keyed by `payment_id` (ULID).
    pub const PAYMENTS: &str = "payments";

    /// Index: purchases by owner, keyed by `user_id || purchase_id`.
    /// Value is empty (index only).
    pub const PURCHASES_BY_USER: &str = "purchases_by_user";

    /// Index: purchases by book, keyed by `book_id || purchase_id`.
    /// Value is empty (index only).
    pub const PURCHASES_BY_BOOK: &str = "purchases_by_book";

    /// Unique index: the payment of a purchase, keyed by `purchase_id`.
    /// Value is the `payment_id`.
    pub const PAYMENTS_BY_PURCHASE: &str = "payments_by_purchase";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::BOOKS,
        cf::USERS,
        cf::PURCHASES,
        cf::PAYMENTS,
        cf::PURCHASES_BY_USER,
        cf::PURCHASES_BY_BOOK,
        cf::PAYMENTS_BY_PURCHASE,
    ]
}
