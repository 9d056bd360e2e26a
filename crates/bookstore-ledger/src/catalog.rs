//! Catalog management.

use serde::Serialize;
use tracing::info;

use bookstore_core::{
    Book, BookFilter, BookId, BookPatch, BookstoreError, NewBook, PurchaseStatus, Result,
};

use crate::Ledger;

/// Where the units of a book currently are.
///
/// `total` stays constant across purchases, payments and cancellations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockReport {
    /// The book.
    pub book_id: BookId,
    /// Units available for new purchases.
    pub on_shelf: u32,
    /// Units held by pending purchases.
    pub reserved: u64,
    /// Units held by processed purchases.
    pub sold: u64,
    /// `on_shelf + reserved + sold`.
    pub total: u64,
}

impl Ledger {
    /// Add a book to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::Validation` if the input is malformed.
    pub async fn create_book(&self, input: NewBook) -> Result<Book> {
        let book = self
            .run_in_transaction("create_book", |tx| {
                let mut book = Book::new(input.clone())?;
                tx.put(&mut book);
                Ok(book)
            })
            .await?;

        info!(book_id = %book.id, title = %book.title, stock = book.stock_quantity, "book created");
        Ok(book)
    }

    /// Fetch a book.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::NotFound` if the book is absent.
    pub fn get_book(&self, book_id: BookId) -> Result<Book> {
        self.store
            .get_book(&book_id)?
            .ok_or_else(|| BookstoreError::not_found("book", book_id))
    }

    /// Books matching every populated criterion of `filter`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::Unavailable` if the store fails.
    pub fn search_books(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        Ok(self
            .store
            .list_books()?
            .into_iter()
            .filter(|book| filter.matches(book))
            .collect())
    }

    /// Edit a book's details. Existing purchases keep their totals.
    ///
    /// # Errors
    ///
    /// - `BookstoreError::NotFound` if the book is absent.
    /// - `BookstoreError::Validation` if the edit is malformed.
    pub async fn update_book(&self, book_id: BookId, patch: BookPatch) -> Result<Book> {
        self.run_in_transaction("update_book", |tx| {
            let mut book = tx
                .get_book(&book_id)?
                .ok_or_else(|| BookstoreError::not_found("book", book_id))?;
            book.apply(patch.clone())?;
            tx.put(&mut book);
            Ok(book)
        })
        .await
    }

    /// Restock (positive `delta`) or write off (negative `delta`) units.
    ///
    /// # Errors
    ///
    /// - `BookstoreError::NotFound` if the book is absent.
    /// - `BookstoreError::InsufficientStock` if the stock would go negative.
    pub async fn adjust_stock(&self, book_id: BookId, delta: i64) -> Result<Book> {
        let book = self
            .run_in_transaction("adjust_stock", |tx| {
                let mut book = tx
                    .get_book(&book_id)?
                    .ok_or_else(|| BookstoreError::not_found("book", book_id))?;
                book.adjust_stock(delta)?;
                tx.put(&mut book);
                Ok(book)
            })
            .await?;

        info!(book_id = %book_id, delta, stock = book.stock_quantity, "stock adjusted");
        Ok(book)
    }

    /// Remove a book from the catalog.
    ///
    /// # Errors
    ///
    /// - `BookstoreError::NotFound` if the book is absent.
    /// - `BookstoreError::InvalidState` while purchases still reference it.
    pub async fn delete_book(&self, book_id: BookId) -> Result<()> {
        self.run_in_transaction("delete_book", |tx| {
            let book = tx
                .get_book(&book_id)?
                .ok_or_else(|| BookstoreError::not_found("book", book_id))?;
            // New purchases write the book, so its guard covers this read.
            let referencing = tx.list_purchases_by_book(&book_id)?.len();
            if referencing > 0 {
                return Err(BookstoreError::InvalidState(format!(
                    "book is referenced by {referencing} purchase(s)"
                )));
            }
            tx.delete(&book);
            Ok(())
        })
        .await?;

        info!(book_id = %book_id, "book deleted");
        Ok(())
    }

    /// Account for every unit of a book.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::NotFound` if the book is absent.
    pub async fn stock_report(&self, book_id: BookId) -> Result<StockReport> {
        self.run_in_transaction("stock_report", |tx| {
            let book = tx
                .get_book(&book_id)?
                .ok_or_else(|| BookstoreError::not_found("book", book_id))?;

            let mut reserved = 0u64;
            let mut sold = 0u64;
            for purchase in tx.list_purchases_by_book(&book_id)? {
                match purchase.status {
                    PurchaseStatus::Pending => reserved += u64::from(purchase.quantity),
                    PurchaseStatus::Processed => sold += u64::from(purchase.quantity),
                    PurchaseStatus::Cancelled => {}
                }
            }

            Ok(StockReport {
                book_id,
                on_shelf: book.stock_quantity,
                reserved,
                sold,
                total: u64::from(book.stock_quantity) + reserved + sold,
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bookstore_core::{Genre, PaymentMethod, UserId};
    use bookstore_store::MemoryStore;
    use chrono::NaiveDate;

    use super::*;
    use crate::AlwaysApprove;

    fn new_book(title: &str, genre: Genre, year: i32, price_cents: i64) -> NewBook {
        NewBook {
            title: title.into(),
            author: "Vários".into(),
            genre,
            release_date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            price_cents,
            description: None,
            stock_quantity: 10,
        }
    }

    fn ledger() -> Ledger {
        Ledger::new(Arc::new(MemoryStore::new()), Arc::new(AlwaysApprove))
    }

    #[tokio::test]
    async fn search_by_genre_date_and_price() {
        let ledger = ledger();
        ledger
            .create_book(new_book("Duna", Genre::Science, 1965, 5000))
            .await
            .unwrap();
        ledger
            .create_book(new_book("O Hobbit", Genre::Fantasy, 1937, 3000))
            .await
            .unwrap();
        ledger
            .create_book(new_book("O Silmarillion", Genre::Fantasy, 1977, 6000))
            .await
            .unwrap();

        let fantasy = ledger
            .search_books(&BookFilter {
                genre: Some(Genre::Fantasy),
                ..BookFilter::default()
            })
            .unwrap();
        assert_eq!(fantasy.len(), 2);

        let cheap_recent = ledger
            .search_books(&BookFilter {
                released_from: NaiveDate::from_ymd_opt(1950, 1, 1),
                max_price_cents: Some(5500),
                ..BookFilter::default()
            })
            .unwrap();
        assert_eq!(cheap_recent.len(), 1);
        assert_eq!(cheap_recent[0].title, "Duna");

        let by_title = ledger
            .search_books(&BookFilter {
                title: Some("hobbit".into()),
                ..BookFilter::default()
            })
            .unwrap();
        assert_eq!(by_title.len(), 1);
    }

    #[tokio::test]
    async fn adjust_stock_never_goes_negative() {
        let ledger = ledger();
        let book = ledger
            .create_book(new_book("Duna", Genre::Science, 1965, 5000))
            .await
            .unwrap();

        assert_eq!(ledger.adjust_stock(book.id, 5).await.unwrap().stock_quantity, 15);
        let err = ledger.adjust_stock(book.id, -16).await.unwrap_err();
        assert!(matches!(err, BookstoreError::InsufficientStock { .. }));
        assert_eq!(ledger.get_book(book.id).unwrap().stock_quantity, 15);
    }

    #[tokio::test]
    async fn price_change_keeps_purchase_totals() {
        let ledger = ledger();
        let user_id = UserId::generate();
        ledger
            .register_user(user_id, "Ana", "ana@example.com")
            .await
            .unwrap();
        let book = ledger
            .create_book(new_book("Duna", Genre::Science, 1965, 5000))
            .await
            .unwrap();
        let purchase = ledger.create_purchase(user_id, book.id, 2).await.unwrap();

        ledger
            .update_book(
                book.id,
                BookPatch {
                    price_cents: Some(9900),
                    ..BookPatch::default()
                },
            )
            .await
            .unwrap();

        let stored = ledger.store().get_purchase(&purchase.id).unwrap().unwrap();
        assert_eq!(stored.total_price_cents, 10_000);
    }

    #[tokio::test]
    async fn referenced_book_cannot_be_deleted() {
        let ledger = ledger();
        let user_id = UserId::generate();
        ledger
            .register_user(user_id, "Ana", "ana@example.com")
            .await
            .unwrap();
        let book = ledger
            .create_book(new_book("Duna", Genre::Science, 1965, 5000))
            .await
            .unwrap();
        let purchase = ledger.create_purchase(user_id, book.id, 1).await.unwrap();

        let err = ledger.delete_book(book.id).await.unwrap_err();
        assert!(matches!(err, BookstoreError::InvalidState(_)));

        ledger.cancel_purchase(user_id, purchase.id).await.unwrap();
        ledger.delete_book(book.id).await.unwrap();
        assert!(matches!(
            ledger.get_book(book.id),
            Err(BookstoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn stock_report_accounts_for_every_unit() {
        let ledger = ledger();
        let user_id = UserId::generate();
        ledger
            .register_user(user_id, "Ana", "ana@example.com")
            .await
            .unwrap();
        let book = ledger
            .create_book(new_book("Duna", Genre::Science, 1965, 5000))
            .await
            .unwrap();

        let paid = ledger.create_purchase(user_id, book.id, 3).await.unwrap();
        ledger.create_purchase(user_id, book.id, 2).await.unwrap();
        ledger
            .pay_purchase(user_id, paid.id, PaymentMethod::CreditCard)
            .await
            .unwrap();

        let report = ledger.stock_report(book.id).await.unwrap();
        assert_eq!(report.on_shelf, 5);
        assert_eq!(report.reserved, 2);
        assert_eq!(report.sold, 3);
        assert_eq!(report.total, 10);
    }
}
