//! Read models for purchase listings.

use serde::Serialize;

use bookstore_core::{
    Book, BookstoreError, Payment, PaymentId, PaymentMethod, PaymentStatus, Purchase, PurchaseId,
    Result, UserId,
};

use crate::transaction::Transaction;
use crate::Ledger;

/// A purchase with the details a customer wants to see next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseView {
    /// The purchase itself.
    #[serde(flatten)]
    pub purchase: Purchase,
    /// The purchased book, if it is still in the catalog.
    pub book: Option<BookSummary>,
    /// The payment, if one was attempted.
    pub payment: Option<PaymentSummary>,
}

/// Catalog details shown with a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookSummary {
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Current unit price in cents.
    pub price_cents: i64,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            price_cents: book.price_cents,
        }
    }
}

/// Payment details shown with a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    /// Payment identifier.
    pub id: PaymentId,
    /// Settlement status.
    pub status: PaymentStatus,
    /// Method used.
    pub payment_method: PaymentMethod,
    /// Amount in cents.
    pub amount_cents: i64,
}

impl From<&Payment> for PaymentSummary {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id,
            status: payment.status,
            payment_method: payment.payment_method,
            amount_cents: payment.amount_cents,
        }
    }
}

fn view(tx: &mut Transaction<'_>, purchase: Purchase) -> Result<PurchaseView> {
    let book = tx.get_book(&purchase.book_id)?;
    let payment = tx.get_payment_by_purchase(&purchase.id)?;
    Ok(PurchaseView {
        book: book.as_ref().map(BookSummary::from),
        payment: payment.as_ref().map(PaymentSummary::from),
        purchase,
    })
}

impl Ledger {
    /// Every purchase of `user_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::Unavailable` if the store fails.
    pub async fn list_purchases(&self, user_id: UserId) -> Result<Vec<PurchaseView>> {
        self.run_in_transaction("list_purchases", |tx| {
            tx.list_purchases_by_user(&user_id)?
                .into_iter()
                .map(|purchase| view(tx, purchase))
                .collect()
        })
        .await
    }

    /// One purchase of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::NotFound` if the purchase is absent or owned
    /// by someone else.
    pub async fn get_purchase(&self, user_id: UserId, purchase_id: PurchaseId) -> Result<PurchaseView> {
        self.run_in_transaction("get_purchase", |tx| {
            let purchase = tx
                .get_purchase(&purchase_id)?
                .filter(|p| p.is_owned_by(&user_id))
                .ok_or_else(|| BookstoreError::not_found("purchase", purchase_id))?;
            view(tx, purchase)
        })
        .await
    }
}
