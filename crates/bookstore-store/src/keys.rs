//! Key encoding utilities for `RocksDB`.
//!
//! All primary keys are the 16 raw bytes of the identifier. Index keys
//! concatenate the owning id with the purchase id; since ULIDs are
//! time-ordered, a prefix scan yields purchases oldest first.

use bookstore_core::{BookId, PaymentId, PurchaseId, UserId};

use crate::changeset::RecordKey;
use crate::error::{Result, StoreError};
use crate::schema::cf;

/// Create a book key from a book ID.
#[must_use]
pub fn book_key(book_id: &BookId) -> Vec<u8> {
    book_id.to_bytes().to_vec()
}

/// Create a user key from a user ID.
#[must_use]
pub fn user_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a purchase key from a purchase ID.
#[must_use]
pub fn purchase_key(purchase_id: &PurchaseId) -> Vec<u8> {
    purchase_id.to_bytes().to_vec()
}

/// Create a payment key from a payment ID.
#[must_use]
pub fn payment_key(payment_id: &PaymentId) -> Vec<u8> {
    payment_id.to_bytes().to_vec()
}

/// Create a user-purchase index key.
///
/// Format: `user_id (16 bytes) || purchase_id (16 bytes)`
#[must_use]
pub fn user_purchase_key(user_id: &UserId, purchase_id: &PurchaseId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&purchase_id.to_bytes());
    key
}

/// Create a book-purchase index key.
///
/// Format: `book_id (16 bytes) || purchase_id (16 bytes)`
#[must_use]
pub fn book_purchase_key(book_id: &BookId, purchase_id: &PurchaseId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(&book_id.to_bytes());
    key.extend_from_slice(&purchase_id.to_bytes());
    key
}

/// Extract the purchase ID from a user- or book-purchase index key.
///
/// # Errors
///
/// Returns `StoreError::Database` if the key is not 32 bytes long.
pub fn purchase_id_from_index_key(key: &[u8]) -> Result<PurchaseId> {
    id_bytes(key.get(16..).unwrap_or_default()).map(PurchaseId::from_bytes)
}

/// Decode a payment ID stored as an index value.
///
/// # Errors
///
/// Returns `StoreError::Database` if the value is not 16 bytes long.
pub fn payment_id_from_value(value: &[u8]) -> Result<PaymentId> {
    id_bytes(value).map(PaymentId::from_bytes)
}

/// Column family and key of a record.
#[must_use]
pub fn locate(key: &RecordKey) -> (&'static str, Vec<u8>) {
    match key {
        RecordKey::Book(id) => (cf::BOOKS, book_key(id)),
        RecordKey::User(id) => (cf::USERS, user_key(id)),
        RecordKey::Purchase(id) => (cf::PURCHASES, purchase_key(id)),
        RecordKey::Payment(id) => (cf::PAYMENTS, payment_key(id)),
    }
}

fn id_bytes(raw: &[u8]) -> Result<[u8; 16]> {
    raw.try_into()
        .map_err(|_| StoreError::Database(format!("malformed id of {} bytes", raw.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_key_lengths() {
        assert_eq!(book_key(&BookId::generate()).len(), 16);
        assert_eq!(user_key(&UserId::generate()).len(), 16);
        assert_eq!(payment_key(&PaymentId::generate()).len(), 16);
    }

    #[test]
    fn user_purchase_key_format() {
        let user_id = UserId::generate();
        let purchase_id = PurchaseId::generate();
        let key = user_purchase_key(&user_id, &purchase_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], user_id.as_bytes());
        assert_eq!(&key[16..], purchase_id.to_bytes());
        assert_eq!(purchase_id_from_index_key(&key).unwrap(), purchase_id);
    }

    #[test]
    fn truncated_index_key_is_an_error() {
        assert!(purchase_id_from_index_key(&[0u8; 20]).is_err());
        assert!(payment_id_from_value(&[]).is_err());
    }

    #[test]
    fn locate_picks_column_family() {
        let id = PaymentId::generate();
        let (cf_name, key) = locate(&RecordKey::Payment(id));
        assert_eq!(cf_name, cf::PAYMENTS);
        assert_eq!(key, payment_key(&id));
    }
}
