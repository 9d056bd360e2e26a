//! Payment records.
//!
//! A payment settles exactly one purchase. Its status moves
//! `pending → paid` or `pending → failed`; a failed payment may be retried,
//! which puts it back to `pending`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BookstoreError, Result};
use crate::{PaymentId, Purchase, PurchaseId};

/// A payment against a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment identifier.
    pub id: PaymentId,

    /// The purchase being paid for.
    pub purchase_id: PurchaseId,

    /// How the customer pays.
    pub payment_method: PaymentMethod,

    /// Settlement status.
    pub status: PaymentStatus,

    /// Amount in cents, equal to the purchase total.
    pub amount_cents: i64,

    /// Reference returned by settlement on approval.
    pub settlement_reference: Option<String>,

    /// Reason returned by settlement on decline.
    pub failure_reason: Option<String>,

    /// When the payment was created.
    pub created_at: DateTime<Utc>,

    /// When the payment last changed.
    pub updated_at: DateTime<Utc>,

    /// Record version (0 = never stored).
    pub version: u64,
}

impl Payment {
    /// Create a pending payment for the full purchase total.
    #[must_use]
    pub fn new(purchase: &Purchase, payment_method: PaymentMethod) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::generate(),
            purchase_id: purchase.id,
            payment_method,
            status: PaymentStatus::Pending,
            amount_cents: purchase.total_price_cents,
            settlement_reference: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Record an approved settlement.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::InvalidState` unless the payment is pending.
    pub fn settle(&mut self, reference: impl Into<String>) -> Result<()> {
        self.transition(PaymentStatus::Paid)?;
        self.settlement_reference = Some(reference.into());
        Ok(())
    }

    /// Record a declined settlement.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::InvalidState` unless the payment is pending.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(PaymentStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    /// Re-arm a failed payment for another attempt, possibly with a new method.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::InvalidState` unless the payment has failed.
    pub fn retry(&mut self, payment_method: PaymentMethod) -> Result<()> {
        if self.status != PaymentStatus::Failed {
            return Err(BookstoreError::InvalidState(format!(
                "payment {} is {} and cannot be retried",
                self.id, self.status
            )));
        }
        self.status = PaymentStatus::Pending;
        self.payment_method = payment_method;
        self.failure_reason = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Take over a pending payment whose previous attempt was abandoned.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::InvalidState` unless the payment is pending.
    pub fn reclaim(&mut self, payment_method: PaymentMethod) -> Result<()> {
        if self.status != PaymentStatus::Pending {
            return Err(BookstoreError::InvalidState(format!(
                "payment {} is {} and cannot be reclaimed",
                self.id, self.status
            )));
        }
        self.payment_method = payment_method;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Whether a pending claim has been held for at least `lease`.
    #[must_use]
    pub fn is_stale(&self, lease: std::time::Duration) -> bool {
        self.status == PaymentStatus::Pending
            && (Utc::now() - self.updated_at)
                .to_std()
                .is_ok_and(|age| age >= lease)
    }

    /// Whether this payment may be discarded when its purchase is cancelled.
    #[must_use]
    pub fn is_removable(&self) -> bool {
        self.status != PaymentStatus::Paid
    }

    fn transition(&mut self, next: PaymentStatus) -> Result<()> {
        if self.status != PaymentStatus::Pending {
            return Err(BookstoreError::InvalidState(format!(
                "payment {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Supported payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Credit card.
    CreditCard,

    /// Brazilian bank slip.
    Boleto,
}

/// Status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created, awaiting settlement.
    Pending,

    /// Settled.
    Paid,

    /// Settlement declined.
    Failed,
}

impl PaymentStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
