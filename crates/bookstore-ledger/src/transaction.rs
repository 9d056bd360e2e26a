//! Unit of work with optimistic concurrency.
//!
//! A [`Transaction`] wraps a [`Store`] for the duration of one attempt:
//!
//! - every record it reads is remembered with the version it had;
//! - writes are staged, and later reads of the same record see them;
//! - on commit, untouched reads become guards, so the commit fails if
//!   anything the attempt looked at has changed since.
//!
//! [`Ledger::run_in_transaction`] re-runs the whole closure when the
//! commit conflicts.

use std::collections::HashMap;

use bookstore_core::{
    Book, BookId, BookstoreError, Payment, PaymentId, Purchase, PurchaseId, Result, User, UserId,
};
use bookstore_store::{Change, ChangeSet, Record, RecordKey, Store};

use crate::Ledger;

/// A record that carries a store version.
pub trait Versioned: Clone + Into<Record> {
    /// The key the record is stored under.
    fn key(&self) -> RecordKey;

    /// The record version.
    fn version(&self) -> u64;

    /// Mutable access to the record version.
    fn version_mut(&mut self) -> &mut u64;
}

macro_rules! versioned {
    ($ty:ty, $variant:ident) => {
        impl Versioned for $ty {
            fn key(&self) -> RecordKey {
                RecordKey::$variant(self.id)
            }

            fn version(&self) -> u64 {
                self.version
            }

            fn version_mut(&mut self) -> &mut u64 {
                &mut self.version
            }
        }
    };
}

versioned!(Book, Book);
versioned!(User, User);
versioned!(Purchase, Purchase);
versioned!(Payment, Payment);

/// One attempt of a unit of work.
pub struct Transaction<'a> {
    store: &'a dyn Store,
    reads: HashMap<RecordKey, u64>,
    writes: HashMap<RecordKey, Change>,
}

impl<'a> Transaction<'a> {
    /// Start an attempt against `store`.
    #[must_use]
    pub fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            reads: HashMap::new(),
            writes: HashMap::new(),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read a book.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn get_book(&mut self, book_id: &BookId) -> Result<Option<Book>> {
        let key = RecordKey::Book(*book_id);
        if let Some(staged) = self.staged(&key) {
            return Ok(staged.and_then(|r| match r {
                Record::Book(b) => Some(b),
                _ => None,
            }));
        }
        let book = self.store.get_book(book_id)?;
        self.observe(key, book.as_ref().map(|b| b.version));
        Ok(book)
    }

    /// Read a user profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn get_user(&mut self, user_id: &UserId) -> Result<Option<User>> {
        let key = RecordKey::User(*user_id);
        if let Some(staged) = self.staged(&key) {
            return Ok(staged.and_then(|r| match r {
                Record::User(u) => Some(u),
                _ => None,
            }));
        }
        let user = self.store.get_user(user_id)?;
        self.observe(key, user.as_ref().map(|u| u.version));
        Ok(user)
    }

    /// Read a purchase.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn get_purchase(&mut self, purchase_id: &PurchaseId) -> Result<Option<Purchase>> {
        let key = RecordKey::Purchase(*purchase_id);
        if let Some(staged) = self.staged(&key) {
            return Ok(staged.and_then(|r| match r {
                Record::Purchase(p) => Some(p),
                _ => None,
            }));
        }
        let purchase = self.store.get_purchase(purchase_id)?;
        self.observe(key, purchase.as_ref().map(|p| p.version));
        Ok(purchase)
    }

    /// Read a payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn get_payment(&mut self, payment_id: &PaymentId) -> Result<Option<Payment>> {
        let key = RecordKey::Payment(*payment_id);
        if let Some(staged) = self.staged(&key) {
            return Ok(staged.and_then(|r| match r {
                Record::Payment(p) => Some(p),
                _ => None,
            }));
        }
        let payment = self.store.get_payment(payment_id)?;
        self.observe(key, payment.as_ref().map(|p| p.version));
        Ok(payment)
    }

    /// Read the payment of a purchase.
    ///
    /// An absent payment cannot be guarded by key; the store's
    /// one-payment-per-purchase check covers a concurrent insert.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn get_payment_by_purchase(&mut self, purchase_id: &PurchaseId) -> Result<Option<Payment>> {
        let staged = self.writes.values().find_map(|change| match change {
            Change::Put(Record::Payment(p)) if p.purchase_id == *purchase_id => Some(p.clone()),
            _ => None,
        });
        if staged.is_some() {
            return Ok(staged);
        }
        let payment = self.store.get_payment_by_purchase(purchase_id)?;
        match payment {
            Some(p) if matches!(self.writes.get(&p.key()), Some(Change::Delete { .. })) => Ok(None),
            Some(p) => {
                self.observe(p.key(), Some(p.version));
                Ok(Some(p))
            }
            None => Ok(None),
        }
    }

    /// Read a user's purchases, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn list_purchases_by_user(&mut self, user_id: &UserId) -> Result<Vec<Purchase>> {
        let purchases = self.store.list_purchases_by_user(user_id)?;
        Ok(self.observe_all(purchases))
    }

    /// Read the purchases of a book, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn list_purchases_by_book(&mut self, book_id: &BookId) -> Result<Vec<Purchase>> {
        let purchases = self.store.list_purchases_by_book(book_id)?;
        Ok(self.observe_all(purchases))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Stage a write of `record`, bumping its version in place.
    ///
    /// Staging the same record again within one attempt replaces the
    /// staged copy without bumping twice.
    pub fn put<T: Versioned>(&mut self, record: &mut T) {
        let key = record.key();
        let already_staged = match self.writes.get(&key) {
            Some(Change::Put(staged)) => staged.version() == record.version(),
            _ => false,
        };
        if !already_staged {
            *record.version_mut() += 1;
        }
        self.writes.insert(key, Change::Put(record.clone().into()));
    }

    /// Stage the removal of `record`.
    pub fn delete<T: Versioned>(&mut self, record: &T) {
        let key = record.key();
        let version = match self.reads.get(&key) {
            Some(version) => *version,
            None if matches!(self.writes.get(&key), Some(Change::Put(_))) => 0,
            None => record.version(),
        };
        if version == 0 {
            // Never stored: dropping the staged insert is enough.
            self.writes.remove(&key);
        } else {
            self.writes.insert(key, Change::Delete { key, version });
        }
    }

    /// Convert the attempt into a change set: staged writes plus a guard
    /// for every record that was read but not written.
    #[must_use]
    pub fn into_change_set(self) -> ChangeSet {
        let mut changes = ChangeSet::new();
        for (key, version) in &self.reads {
            if !self.writes.contains_key(key) {
                changes.guard(*key, *version);
            }
        }
        for change in self.writes.into_values() {
            match change {
                Change::Put(record) => changes.put(record),
                Change::Delete { key, version } => changes.delete(key, version),
                Change::Guard { key, version } => changes.guard(key, version),
            }
        }
        changes
    }

    /// Staged state of a key: `Some(Some(record))` for a staged put,
    /// `Some(None)` for a staged delete, `None` when untouched.
    fn staged(&self, key: &RecordKey) -> Option<Option<Record>> {
        match self.writes.get(key)? {
            Change::Put(record) => Some(Some(record.clone())),
            Change::Delete { .. } => Some(None),
            Change::Guard { .. } => None,
        }
    }

    fn observe(&mut self, key: RecordKey, version: Option<u64>) {
        self.reads.entry(key).or_insert(version.unwrap_or(0));
    }

    fn observe_all(&mut self, purchases: Vec<Purchase>) -> Vec<Purchase> {
        purchases
            .into_iter()
            .filter_map(|purchase| match self.staged(&purchase.key()) {
                Some(Some(Record::Purchase(staged))) => Some(staged),
                Some(_) => None,
                None => {
                    self.observe(purchase.key(), Some(purchase.version));
                    Some(purchase)
                }
            })
            .collect()
    }
}

impl Ledger {
    /// Run `body` as a unit of work, retrying on write conflicts.
    ///
    /// `body` may run several times and must not have side effects outside
    /// the transaction. Errors returned by `body` abort without retrying.
    ///
    /// # Errors
    ///
    /// - Whatever `body` returns.
    /// - `BookstoreError::Unavailable` when every attempt conflicted or the
    ///   store is down.
    pub async fn run_in_transaction<T, F>(&self, operation: &'static str, mut body: F) -> Result<T>
    where
        F: FnMut(&mut Transaction<'_>) -> Result<T>,
    {
        for attempt in 1..=self.max_attempts {
            if let Some(value) = self.attempt(operation, attempt, &mut body)? {
                return Ok(value);
            }
            tokio::task::yield_now().await;
        }
        Err(self.exhausted(operation))
    }

    /// [`Ledger::run_in_transaction`] for contexts that cannot await, such
    /// as `Drop`. Conflicting attempts are retried immediately.
    pub(crate) fn run_blocking<T, F>(&self, operation: &'static str, mut body: F) -> Result<T>
    where
        F: FnMut(&mut Transaction<'_>) -> Result<T>,
    {
        for attempt in 1..=self.max_attempts {
            if let Some(value) = self.attempt(operation, attempt, &mut body)? {
                return Ok(value);
            }
        }
        Err(self.exhausted(operation))
    }

    /// One attempt: `Ok(None)` when the commit conflicted.
    fn attempt<T, F>(&self, operation: &'static str, attempt: u32, body: &mut F) -> Result<Option<T>>
    where
        F: FnMut(&mut Transaction<'_>) -> Result<T>,
    {
        let mut tx = Transaction::new(self.store.as_ref());
        let value = body(&mut tx)?;
        match self.store.commit(tx.into_change_set()) {
            Ok(()) => Ok(Some(value)),
            Err(err) if err.is_conflict() => {
                tracing::debug!(operation, attempt, error = %err, "transaction conflict, retrying");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn exhausted(&self, operation: &'static str) -> BookstoreError {
        tracing::warn!(operation, attempts = self.max_attempts, "transaction retries exhausted");
        BookstoreError::Unavailable(format!("{operation}: too much contention, retry later"))
    }
}
