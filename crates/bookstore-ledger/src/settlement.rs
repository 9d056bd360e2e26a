//! Settlement capability.
//!
//! The ledger never talks to a payment provider directly. It asks a
//! [`Settlement`] implementation to authorize a claimed payment and records
//! whatever outcome comes back.

use async_trait::async_trait;
use serde::Serialize;

use bookstore_core::{Payment, PaymentId, PaymentMethod, Purchase, PurchaseId, UserId};

/// What is being charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementRequest {
    /// Payment being settled.
    pub payment_id: PaymentId,
    /// Purchase the payment belongs to.
    pub purchase_id: PurchaseId,
    /// Paying user.
    pub user_id: UserId,
    /// Amount in cents.
    pub amount_cents: i64,
    /// Payment method chosen by the user.
    pub payment_method: PaymentMethod,
}

impl SettlementRequest {
    /// Build the request for a claimed payment.
    #[must_use]
    pub fn new(purchase: &Purchase, payment: &Payment) -> Self {
        Self {
            payment_id: payment.id,
            purchase_id: purchase.id,
            user_id: purchase.user_id,
            amount_cents: payment.amount_cents,
            payment_method: payment.payment_method,
        }
    }
}

/// Result of an authorization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Funds captured.
    Approved {
        /// Provider reference for the capture.
        reference: String,
    },
    /// Charge refused.
    Declined {
        /// Provider reason.
        reason: String,
    },
}

/// Payment provider abstraction.
///
/// Implementations report transport failures as
/// [`SettlementOutcome::Declined`] so the payment can be retried.
#[async_trait]
pub trait Settlement: Send + Sync {
    /// Authorize and capture a payment.
    async fn authorize(&self, request: &SettlementRequest) -> SettlementOutcome;
}

/// Settlement that approves every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysApprove;

#[async_trait]
impl Settlement for AlwaysApprove {
    async fn authorize(&self, request: &SettlementRequest) -> SettlementOutcome {
        tracing::debug!(
            payment_id = %request.payment_id,
            amount_cents = request.amount_cents,
            "auto-approving settlement"
        );
        SettlementOutcome::Approved {
            reference: format!("auto-{}", request.payment_id),
        }
    }
}
