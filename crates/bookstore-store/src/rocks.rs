//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.
//! Commits are serialized by a process-local lock: validation reads and the
//! `WriteBatch` happen under it, so a batch lands only against the state it
//! was checked against.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use bookstore_core::{Book, BookId, Payment, PaymentId, Purchase, PurchaseId, User, UserId};

use crate::changeset::{Change, ChangeSet, Record, RecordKey};
use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    commit_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            commit_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get<T: serde::de::DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn get_raw(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Purchase IDs under an index prefix, in key (creation) order.
    fn scan_index(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<PurchaseId>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));

        let mut ids = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            ids.push(keys::purchase_id_from_index_key(&key)?);
        }
        Ok(ids)
    }

    fn load_purchases(&self, ids: Vec<PurchaseId>) -> Result<Vec<Purchase>> {
        let mut purchases = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(purchase) = self.get_purchase(&id)? {
                purchases.push(purchase);
            }
        }
        Ok(purchases)
    }

    fn version_of(&self, key: &RecordKey) -> Result<u64> {
        Ok(match key {
            RecordKey::Book(id) => self.get_book(id)?.map_or(0, |b| b.version),
            RecordKey::User(id) => self.get_user(id)?.map_or(0, |u| u.version),
            RecordKey::Purchase(id) => self.get_purchase(id)?.map_or(0, |p| p.version),
            RecordKey::Payment(id) => self.get_payment(id)?.map_or(0, |p| p.version),
        })
    }

    fn payment_slot(&self, purchase_id: &PurchaseId) -> Result<Option<PaymentId>> {
        self.get_raw(cf::PAYMENTS_BY_PURCHASE, &keys::purchase_key(purchase_id))?
            .map(|value| keys::payment_id_from_value(&value))
            .transpose()
    }

    /// Stage the removal of a record and its index entries.
    fn stage_delete(&self, batch: &mut WriteBatch, key: &RecordKey) -> Result<()> {
        let (cf_name, raw_key) = keys::locate(key);
        batch.delete_cf(&self.cf(cf_name)?, &raw_key);

        match key {
            RecordKey::Purchase(id) => {
                if let Some(purchase) = self.get_purchase(id)? {
                    batch.delete_cf(
                        &self.cf(cf::PURCHASES_BY_USER)?,
                        keys::user_purchase_key(&purchase.user_id, id),
                    );
                    batch.delete_cf(
                        &self.cf(cf::PURCHASES_BY_BOOK)?,
                        keys::book_purchase_key(&purchase.book_id, id),
                    );
                }
            }
            RecordKey::Payment(id) => {
                if let Some(payment) = self.get_payment(id)? {
                    if self.payment_slot(&payment.purchase_id)? == Some(*id) {
                        batch.delete_cf(
                            &self.cf(cf::PAYMENTS_BY_PURCHASE)?,
                            keys::purchase_key(&payment.purchase_id),
                        );
                    }
                }
            }
            RecordKey::Book(_) | RecordKey::User(_) => {}
        }
        Ok(())
    }

    /// Stage a record write and its index entries.
    fn stage_put(&self, batch: &mut WriteBatch, record: &Record) -> Result<()> {
        let (cf_name, raw_key) = keys::locate(&record.key());
        let value = match record {
            Record::Book(book) => Self::serialize(book)?,
            Record::User(user) => Self::serialize(user)?,
            Record::Purchase(purchase) => {
                batch.put_cf(
                    &self.cf(cf::PURCHASES_BY_USER)?,
                    keys::user_purchase_key(&purchase.user_id, &purchase.id),
                    [],
                );
                batch.put_cf(
                    &self.cf(cf::PURCHASES_BY_BOOK)?,
                    keys::book_purchase_key(&purchase.book_id, &purchase.id),
                    [],
                );
                Self::serialize(purchase)?
            }
            Record::Payment(payment) => {
                batch.put_cf(
                    &self.cf(cf::PAYMENTS_BY_PURCHASE)?,
                    keys::purchase_key(&payment.purchase_id),
                    payment.id.to_bytes(),
                );
                Self::serialize(payment)?
            }
        };
        batch.put_cf(&self.cf(cf_name)?, raw_key, value);
        Ok(())
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Book Operations
    // =========================================================================

    fn get_book(&self, book_id: &BookId) -> Result<Option<Book>> {
        self.get(cf::BOOKS, &keys::book_key(book_id))
    }

    fn list_books(&self) -> Result<Vec<Book>> {
        let cf = self.cf(cf::BOOKS)?;
        let mut books = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            books.push(Self::deserialize(&value)?);
        }
        Ok(books)
    }

    // =========================================================================
    // User Operations
    // =========================================================================

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        self.get(cf::USERS, &keys::user_key(user_id))
    }

    // =========================================================================
    // Purchase Operations
    // =========================================================================

    fn get_purchase(&self, purchase_id: &PurchaseId) -> Result<Option<Purchase>> {
        self.get(cf::PURCHASES, &keys::purchase_key(purchase_id))
    }

    fn list_purchases_by_user(&self, user_id: &UserId) -> Result<Vec<Purchase>> {
        let ids = self.scan_index(cf::PURCHASES_BY_USER, &keys::user_key(user_id))?;
        self.load_purchases(ids)
    }

    fn list_purchases_by_book(&self, book_id: &BookId) -> Result<Vec<Purchase>> {
        let ids = self.scan_index(cf::PURCHASES_BY_BOOK, &keys::book_key(book_id))?;
        self.load_purchases(ids)
    }

    // =========================================================================
    // Payment Operations
    // =========================================================================

    fn get_payment(&self, payment_id: &PaymentId) -> Result<Option<Payment>> {
        self.get(cf::PAYMENTS, &keys::payment_key(payment_id))
    }

    fn get_payment_by_purchase(&self, purchase_id: &PurchaseId) -> Result<Option<Payment>> {
        match self.payment_slot(purchase_id)? {
            Some(payment_id) => self.get_payment(&payment_id),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Commit
    // =========================================================================

    fn commit(&self, changes: ChangeSet) -> Result<()> {
        let _guard = self
            .commit_lock
            .lock()
            .map_err(|_| StoreError::Database("commit lock poisoned".into()))?;

        changes.validate(|key| self.version_of(key), |id| self.payment_slot(id))?;
        if !changes.has_writes() {
            return Ok(());
        }

        // Deletes first so a replacement payment keeps its index slot.
        let mut batch = WriteBatch::default();
        for change in changes.changes() {
            if let Change::Delete { key, .. } = change {
                self.stage_delete(&mut batch, key)?;
            }
        }
        for change in changes.changes() {
            if let Change::Put(record) = change {
                self.stage_put(&mut batch, record)?;
            }
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::trace!(changes = changes.changes().len(), "committed change set");
        Ok(())
    }
}
