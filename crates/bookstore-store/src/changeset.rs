//! Atomic, version-checked write batches.
//!
//! A [`ChangeSet`] is what a unit of work hands to [`Store::commit`]. Every
//! change names the version it expects to find in the store:
//!
//! | Change   | Stored version must be       |
//! |----------|------------------------------|
//! | `Put`    | `record.version - 1` (0 = absent) |
//! | `Delete` | `version` (never 0)          |
//! | `Guard`  | `version` (0 = absent)       |
//!
//! A single mismatch rejects the whole set with [`StoreError::Conflict`].
//!
//! [`Store::commit`]: crate::Store::commit

use std::collections::HashSet;
use std::fmt;

use bookstore_core::{Book, BookId, Payment, PaymentId, Purchase, PurchaseId, User, UserId};

use crate::error::{Result, StoreError};

/// Identity of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    /// A catalog entry.
    Book(BookId),
    /// A user profile.
    User(UserId),
    /// A purchase.
    Purchase(PurchaseId),
    /// A payment.
    Payment(PaymentId),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Book(id) => write!(f, "book {id}"),
            Self::User(id) => write!(f, "user {id}"),
            Self::Purchase(id) => write!(f, "purchase {id}"),
            Self::Payment(id) => write!(f, "payment {id}"),
        }
    }
}

/// A full record to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A catalog entry.
    Book(Book),
    /// A user profile.
    User(User),
    /// A purchase.
    Purchase(Purchase),
    /// A payment.
    Payment(Payment),
}

impl Record {
    /// The key this record is stored under.
    #[must_use]
    pub const fn key(&self) -> RecordKey {
        match self {
            Self::Book(b) => RecordKey::Book(b.id),
            Self::User(u) => RecordKey::User(u.id),
            Self::Purchase(p) => RecordKey::Purchase(p.id),
            Self::Payment(p) => RecordKey::Payment(p.id),
        }
    }

    /// The version carried by the record.
    #[must_use]
    pub const fn version(&self) -> u64 {
        match self {
            Self::Book(b) => b.version,
            Self::User(u) => u.version,
            Self::Purchase(p) => p.version,
            Self::Payment(p) => p.version,
        }
    }
}

impl From<Book> for Record {
    fn from(book: Book) -> Self {
        Self::Book(book)
    }
}

impl From<User> for Record {
    fn from(user: User) -> Self {
        Self::User(user)
    }
}

impl From<Purchase> for Record {
    fn from(purchase: Purchase) -> Self {
        Self::Purchase(purchase)
    }
}

impl From<Payment> for Record {
    fn from(payment: Payment) -> Self {
        Self::Payment(payment)
    }
}

/// One entry of a [`ChangeSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Insert or replace a record.
    Put(Record),
    /// Remove a record.
    Delete {
        /// Record to remove.
        key: RecordKey,
        /// Version the record must still have.
        version: u64,
    },
    /// Write nothing, but require the record to be unchanged.
    Guard {
        /// Record that was read.
        key: RecordKey,
        /// Version observed when it was read (0 = observed absent).
        version: u64,
    },
}

impl Change {
    /// The record this change concerns.
    #[must_use]
    pub const fn key(&self) -> RecordKey {
        match self {
            Self::Put(record) => record.key(),
            Self::Delete { key, .. } | Self::Guard { key, .. } => *key,
        }
    }

    fn expected_version(&self) -> Result<u64> {
        match self {
            Self::Put(record) => record.version().checked_sub(1).ok_or_else(|| {
                StoreError::InvalidWrite(format!("{} written with version 0", record.key()))
            }),
            Self::Delete { key, version: 0 } => Err(StoreError::InvalidWrite(format!(
                "{key} deleted with version 0"
            ))),
            Self::Delete { version, .. } | Self::Guard { version, .. } => Ok(*version),
        }
    }
}

/// An all-or-nothing batch of writes and read guards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Create an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a record write.
    pub fn put(&mut self, record: impl Into<Record>) {
        self.changes.push(Change::Put(record.into()));
    }

    /// Stage a record removal.
    pub fn delete(&mut self, key: RecordKey, version: u64) {
        self.changes.push(Change::Delete { key, version });
    }

    /// Require a record to still be at `version` when the set commits.
    pub fn guard(&mut self, key: RecordKey, version: u64) {
        self.changes.push(Change::Guard { key, version });
    }

    /// Whether the set contains no changes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Whether the set contains anything besides guards.
    #[must_use]
    pub fn has_writes(&self) -> bool {
        self.changes
            .iter()
            .any(|c| !matches!(c, Change::Guard { .. }))
    }

    /// Staged changes in order.
    #[must_use]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Check every change against the current state of a backend.
    ///
    /// `current_version` returns the stored version of a key (0 when
    /// absent). `payment_slot` returns the payment currently indexed for a
    /// purchase. Backends call this while holding their commit lock, then
    /// apply the changes.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidWrite` if a key appears twice or a version is malformed.
    /// - `StoreError::Conflict` if any version no longer matches, or a new
    ///   payment targets a purchase that already has one.
    pub fn validate<V, P>(&self, mut current_version: V, mut payment_slot: P) -> Result<()>
    where
        V: FnMut(&RecordKey) -> Result<u64>,
        P: FnMut(&PurchaseId) -> Result<Option<PaymentId>>,
    {
        let mut seen = HashSet::with_capacity(self.changes.len());
        for change in &self.changes {
            let key = change.key();
            if !seen.insert(key) {
                return Err(StoreError::InvalidWrite(format!(
                    "{key} appears twice in one change set"
                )));
            }
            let expected = change.expected_version()?;
            if current_version(&key)? != expected {
                return Err(StoreError::Conflict {
                    key: key.to_string(),
                });
            }
        }

        let deleted: HashSet<PaymentId> = self
            .changes
            .iter()
            .filter_map(|c| match c {
                Change::Delete {
                    key: RecordKey::Payment(id),
                    ..
                } => Some(*id),
                _ => None,
            })
            .collect();

        let mut claimed = HashSet::new();
        for change in &self.changes {
            let Change::Put(Record::Payment(payment)) = change else {
                continue;
            };
            if !claimed.insert(payment.purchase_id) {
                return Err(StoreError::InvalidWrite(format!(
                    "two payments for purchase {} in one change set",
                    payment.purchase_id
                )));
            }
            match payment_slot(&payment.purchase_id)? {
                Some(existing) if existing != payment.id && !deleted.contains(&existing) => {
                    return Err(StoreError::Conflict {
                        key: format!("payment slot of purchase {}", payment.purchase_id),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}
