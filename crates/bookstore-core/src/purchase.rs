//! Purchase records and their lifecycle.
//!
//! ```text
//! pending ──pay──▶ processed
//!    │
//!    └──cancel──▶ cancelled
//! ```
//!
//! Both `processed` and `cancelled` are terminal. A pending purchase holds
//! its units of stock; so does a processed one, permanently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BookstoreError, Result};
use crate::{Book, BookId, PurchaseId, UserId};

/// A user's order for some units of one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// Purchase identifier.
    pub id: PurchaseId,

    /// Owner of the purchase.
    pub user_id: UserId,

    /// The purchased book.
    pub book_id: BookId,

    /// Units purchased (always > 0).
    pub quantity: u32,

    /// Unit price × quantity, frozen when the purchase was created.
    pub total_price_cents: i64,

    /// Lifecycle status.
    pub status: PurchaseStatus,

    /// When the purchase was created.
    pub created_at: DateTime<Utc>,

    /// When the purchase last changed.
    pub updated_at: DateTime<Utc>,

    /// Record version (0 = never stored).
    pub version: u64,
}

impl Purchase {
    /// Create a pending purchase of `quantity` units of `book` at its current price.
    ///
    /// This does not touch the book's stock; callers reserve it separately
    /// within the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::Validation` if `quantity` is zero or the
    /// total overflows.
    pub fn new(user_id: UserId, book: &Book, quantity: u32) -> Result<Self> {
        if quantity == 0 {
            return Err(BookstoreError::Validation(
                "quantity must be greater than zero".into(),
            ));
        }
        let total_price_cents = book.price_for(quantity)?;
        let now = Utc::now();
        Ok(Self {
            id: PurchaseId::generate(),
            user_id,
            book_id: book.id,
            quantity,
            total_price_cents,
            status: PurchaseStatus::Pending,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Whether `user_id` owns this purchase.
    #[must_use]
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user_id == *user_id
    }

    /// Whether this purchase currently accounts for units of stock.
    #[must_use]
    pub fn holds_stock(&self) -> bool {
        self.status.holds_stock()
    }

    /// Mark the purchase as paid for.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::InvalidState` unless the purchase is pending.
    pub fn mark_processed(&mut self) -> Result<()> {
        self.transition(PurchaseStatus::Processed)
    }

    /// Cancel the purchase, returning the number of units to put back on the shelf.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::InvalidState` unless the purchase is pending.
    pub fn cancel(&mut self) -> Result<u32> {
        if self.status == PurchaseStatus::Processed {
            return Err(BookstoreError::InvalidState(
                "cannot cancel a paid purchase".into(),
            ));
        }
        self.transition(PurchaseStatus::Cancelled)?;
        Ok(self.quantity)
    }

    fn transition(&mut self, next: PurchaseStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(BookstoreError::InvalidState(format!(
                "purchase {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Status of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    /// Created, stock reserved, awaiting payment.
    Pending,

    /// Paid; terminal.
    Processed,

    /// Reversed before payment; terminal.
    Cancelled,
}

impl PurchaseStatus {
    /// Whether the lifecycle allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processed | Self::Cancelled)
        )
    }

    /// Whether purchases in this status account for units of stock.
    #[must_use]
    pub const fn holds_stock(self) -> bool {
        matches!(self, Self::Pending | Self::Processed)
    }

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
