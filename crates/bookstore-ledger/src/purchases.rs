//! Purchase creation and cancellation.

use serde::Serialize;
use tracing::{info, warn};

use bookstore_core::{
    BookId, BookstoreError, Purchase, PurchaseId, PurchaseStatus, Result, UserId,
};

use crate::Ledger;

/// Outcome of a successful cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cancellation {
    /// The removed purchase.
    pub purchase_id: PurchaseId,
    /// Its book.
    pub book_id: BookId,
    /// Units handed back to the shelf.
    pub released_quantity: u32,
    /// Whether a payment record was discarded with it.
    pub payment_removed: bool,
}

impl Ledger {
    /// Reserve stock and open a pending purchase.
    ///
    /// # Errors
    ///
    /// - `BookstoreError::Validation` if `quantity` is zero or the total overflows.
    /// - `BookstoreError::NotFound` if the user profile or the book is absent.
    /// - `BookstoreError::InsufficientStock` if `quantity` exceeds the stock.
    /// - `BookstoreError::Unavailable` under sustained contention.
    pub async fn create_purchase(
        &self,
        user_id: UserId,
        book_id: BookId,
        quantity: u32,
    ) -> Result<Purchase> {
        if quantity == 0 {
            return Err(BookstoreError::Validation(
                "quantity must be greater than zero".into(),
            ));
        }

        let purchase = self
            .run_in_transaction("create_purchase", |tx| {
                let mut user = tx
                    .get_user(&user_id)?
                    .ok_or_else(|| BookstoreError::not_found("user", user_id))?;
                let mut book = tx
                    .get_book(&book_id)?
                    .ok_or_else(|| BookstoreError::not_found("book", book_id))?;

                let mut purchase = Purchase::new(user_id, &book, quantity)?;
                book.reserve(quantity)?;

                tx.put(&mut book);
                tx.put(&mut purchase);
                // Account wipes guard on the profile version.
                tx.put(&mut user);
                Ok(purchase)
            })
            .await?;

        info!(
            purchase_id = %purchase.id,
            user_id = %user_id,
            book_id = %book_id,
            quantity,
            total_cents = purchase.total_price_cents,
            "purchase created"
        );
        Ok(purchase)
    }

    /// Cancel a pending purchase: discard its unpaid payment, return its
    /// units to the shelf and remove it.
    ///
    /// # Errors
    ///
    /// - `BookstoreError::NotFound` if the purchase is absent or owned by someone else.
    /// - `BookstoreError::InvalidState` if the purchase has been paid.
    /// - `BookstoreError::Unavailable` under sustained contention.
    pub async fn cancel_purchase(
        &self,
        user_id: UserId,
        purchase_id: PurchaseId,
    ) -> Result<Cancellation> {
        let (cancellation, restocked) = self
            .run_in_transaction("cancel_purchase", |tx| {
                let mut purchase = tx
                    .get_purchase(&purchase_id)?
                    .filter(|p| p.is_owned_by(&user_id))
                    .ok_or_else(|| BookstoreError::not_found("purchase", purchase_id))?;

                let payment = tx.get_payment_by_purchase(&purchase_id)?;
                let paid = payment.as_ref().is_some_and(|p| !p.is_removable());
                if paid || purchase.status == PurchaseStatus::Processed {
                    return Err(BookstoreError::InvalidState(
                        "cannot cancel a paid purchase".into(),
                    ));
                }

                let released_quantity = purchase.cancel()?;
                if let Some(payment) = &payment {
                    tx.delete(payment);
                }

                let restocked = match tx.get_book(&purchase.book_id)? {
                    Some(mut book) => {
                        book.release(released_quantity)?;
                        tx.put(&mut book);
                        true
                    }
                    None => false,
                };
                tx.delete(&purchase);

                Ok((
                    Cancellation {
                        purchase_id,
                        book_id: purchase.book_id,
                        released_quantity,
                        payment_removed: payment.is_some(),
                    },
                    restocked,
                ))
            })
            .await?;

        if !restocked {
            warn!(
                purchase_id = %purchase_id,
                book_id = %cancellation.book_id,
                quantity = cancellation.released_quantity,
                "book no longer exists, stock not restored"
            );
        }
        info!(
            purchase_id = %purchase_id,
            user_id = %user_id,
            released = cancellation.released_quantity,
            "purchase cancelled"
        );
        Ok(cancellation)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bookstore_core::{Genre, NewBook};
    use bookstore_store::{MemoryStore, Store};
    use chrono::NaiveDate;

    use super::*;
    use crate::AlwaysApprove;

    async fn setup(stock: u32) -> (Ledger, UserId, BookId) {
        let ledger = Ledger::new(Arc::new(MemoryStore::new()), Arc::new(AlwaysApprove));
        let user_id = UserId::generate();
        ledger
            .register_user(user_id, "Ana", "ana@example.com")
            .await
            .unwrap();
        let book = ledger
            .create_book(NewBook {
                title: "Capitães da Areia".into(),
                author: "Jorge Amado".into(),
                genre: Genre::Fiction,
                release_date: NaiveDate::from_ymd_opt(1937, 1, 1).unwrap(),
                price_cents: 1000,
                description: None,
                stock_quantity: stock,
            })
            .await
            .unwrap();
        (ledger, user_id, book.id)
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected_before_reading() {
        let (ledger, user_id, book_id) = setup(5).await;
        let err = ledger.create_purchase(user_id, book_id, 0).await.unwrap_err();
        assert!(matches!(err, BookstoreError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_user_or_book() {
        let (ledger, user_id, book_id) = setup(5).await;
        let err = ledger
            .create_purchase(UserId::generate(), book_id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, BookstoreError::NotFound { entity: "user", .. }));

        let err = ledger
            .create_purchase(user_id, BookId::generate(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, BookstoreError::NotFound { entity: "book", .. }));
    }

    #[tokio::test]
    async fn insufficient_stock_changes_nothing() {
        let (ledger, user_id, book_id) = setup(2).await;
        let err = ledger.create_purchase(user_id, book_id, 3).await.unwrap_err();
        assert!(matches!(
            err,
            BookstoreError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            }
        ));
        let book = ledger.store().get_book(&book_id).unwrap().unwrap();
        assert_eq!(book.stock_quantity, 2);
        assert!(ledger.store().list_purchases_by_user(&user_id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_users_cannot_cancel() {
        let (ledger, user_id, book_id) = setup(5).await;
        let purchase = ledger.create_purchase(user_id, book_id, 2).await.unwrap();

        let err = ledger
            .cancel_purchase(UserId::generate(), purchase.id)
            .await
            .unwrap_err();
        assert!(matches!(err, BookstoreError::NotFound { .. }));
        assert!(ledger.store().get_purchase(&purchase.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn cancel_releases_stock_and_removes_purchase() {
        let (ledger, user_id, book_id) = setup(5).await;
        let purchase = ledger.create_purchase(user_id, book_id, 2).await.unwrap();

        let cancellation = ledger.cancel_purchase(user_id, purchase.id).await.unwrap();
        assert_eq!(cancellation.released_quantity, 2);
        assert!(!cancellation.payment_removed);

        assert!(ledger.store().get_purchase(&purchase.id).unwrap().is_none());
        let book = ledger.store().get_book(&book_id).unwrap().unwrap();
        assert_eq!(book.stock_quantity, 5);

        let err = ledger.cancel_purchase(user_id, purchase.id).await.unwrap_err();
        assert!(matches!(err, BookstoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn purchase_bumps_owner_version() {
        let (ledger, user_id, book_id) = setup(5).await;
        let before = ledger.store().get_user(&user_id).unwrap().unwrap();

        ledger.create_purchase(user_id, book_id, 1).await.unwrap();

        // An account wipe that read the profile before this commit conflicts.
        let after = ledger.store().get_user(&user_id).unwrap().unwrap();
        assert_eq!(after.version, before.version + 1);
    }
}
