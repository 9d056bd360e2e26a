//! In-memory storage implementation.
//!
//! This module provides the `MemoryStore` implementation of the `Store` trait.
//! Data lives for the lifetime of the process.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use bookstore_core::{Book, BookId, Payment, PaymentId, Purchase, PurchaseId, User, UserId};

use crate::changeset::{Change, ChangeSet, Record, RecordKey};
use crate::error::{Result, StoreError};
use crate::Store;

#[derive(Default)]
struct Tables {
    books: BTreeMap<BookId, Book>,
    users: BTreeMap<UserId, User>,
    purchases: BTreeMap<PurchaseId, Purchase>,
    payments: BTreeMap<PaymentId, Payment>,
    payments_by_purchase: HashMap<PurchaseId, PaymentId>,
}

impl Tables {
    fn version_of(&self, key: &RecordKey) -> u64 {
        match key {
            RecordKey::Book(id) => self.books.get(id).map_or(0, |b| b.version),
            RecordKey::User(id) => self.users.get(id).map_or(0, |u| u.version),
            RecordKey::Purchase(id) => self.purchases.get(id).map_or(0, |p| p.version),
            RecordKey::Payment(id) => self.payments.get(id).map_or(0, |p| p.version),
        }
    }

    fn remove(&mut self, key: &RecordKey) {
        match key {
            RecordKey::Book(id) => {
                self.books.remove(id);
            }
            RecordKey::User(id) => {
                self.users.remove(id);
            }
            RecordKey::Purchase(id) => {
                self.purchases.remove(id);
            }
            RecordKey::Payment(id) => {
                if let Some(payment) = self.payments.remove(id) {
                    if self.payments_by_purchase.get(&payment.purchase_id) == Some(id) {
                        self.payments_by_purchase.remove(&payment.purchase_id);
                    }
                }
            }
        }
    }

    fn insert(&mut self, record: Record) {
        match record {
            Record::Book(book) => {
                self.books.insert(book.id, book);
            }
            Record::User(user) => {
                self.users.insert(user.id, user);
            }
            Record::Purchase(purchase) => {
                self.purchases.insert(purchase.id, purchase);
            }
            Record::Payment(payment) => {
                self.payments_by_purchase
                    .insert(payment.purchase_id, payment.id);
                self.payments.insert(payment.id, payment);
            }
        }
    }
}

/// Process-local storage backed by ordered maps.
///
/// Commits take the write lock, validate, then apply, so a commit is atomic
/// with respect to every reader.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }
}

impl Store for MemoryStore {
    fn get_book(&self, book_id: &BookId) -> Result<Option<Book>> {
        Ok(self.read()?.books.get(book_id).cloned())
    }

    fn list_books(&self) -> Result<Vec<Book>> {
        Ok(self.read()?.books.values().cloned().collect())
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        Ok(self.read()?.users.get(user_id).cloned())
    }

    fn get_purchase(&self, purchase_id: &PurchaseId) -> Result<Option<Purchase>> {
        Ok(self.read()?.purchases.get(purchase_id).cloned())
    }

    fn list_purchases_by_user(&self, user_id: &UserId) -> Result<Vec<Purchase>> {
        Ok(self
            .read()?
            .purchases
            .values()
            .filter(|p| p.user_id == *user_id)
            .cloned()
            .collect())
    }

    fn list_purchases_by_book(&self, book_id: &BookId) -> Result<Vec<Purchase>> {
        Ok(self
            .read()?
            .purchases
            .values()
            .filter(|p| p.book_id == *book_id)
            .cloned()
            .collect())
    }

    fn get_payment(&self, payment_id: &PaymentId) -> Result<Option<Payment>> {
        Ok(self.read()?.payments.get(payment_id).cloned())
    }

    fn get_payment_by_purchase(&self, purchase_id: &PurchaseId) -> Result<Option<Payment>> {
        let tables = self.read()?;
        Ok(tables
            .payments_by_purchase
            .get(purchase_id)
            .and_then(|id| tables.payments.get(id))
            .cloned())
    }

    fn commit(&self, changes: ChangeSet) -> Result<()> {
        let mut tables = self.write()?;
        changes.validate(
            |key| Ok(tables.version_of(key)),
            |purchase_id| Ok(tables.payments_by_purchase.get(purchase_id).copied()),
        )?;

        // Deletes first so a replacement payment keeps its index slot.
        let (deletes, rest): (Vec<_>, Vec<_>) = changes
            .into_iter()
            .partition(|c| matches!(c, Change::Delete { .. }));
        for change in deletes.into_iter().chain(rest) {
            match change {
                Change::Delete { key, .. } => tables.remove(&key),
                Change::Put(record) => tables.insert(record),
                Change::Guard { .. } => {}
            }
        }
        Ok(())
    }
}
