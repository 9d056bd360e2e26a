//! Paying for a purchase.
//!
//! Payment runs in three steps so the settlement call never happens inside
//! a unit of work:
//!
//! 1. **Claim**: create (or re-arm a failed) pending payment.
//! 2. **Authorize**: ask the [`Settlement`](crate::Settlement) capability.
//! 3. **Settle**: record the outcome. On approval the payment becomes
//!    `paid` and the purchase `processed` in one commit.
//!
//! A cancellation that lands between claim and settle removes the claimed
//! payment, so the settle step finds nothing and writes nothing.
//!
//! A claim never blocks a purchase for good:
//!
//! - if the `pay_purchase` future is dropped before settling (a request
//!   timeout, a client hang-up), the claim is released as `failed`;
//! - if the process dies instead, the claim is taken over by the next
//!   attempt once it is older than [`Ledger::claim_lease`]. The older
//!   attempt then fails its settle step on the version check.

use tracing::{info, warn};

use bookstore_core::{
    BookstoreError, Payment, PaymentMethod, PaymentStatus, Purchase, PurchaseId, PurchaseStatus,
    Result, UserId,
};

use crate::settlement::{SettlementOutcome, SettlementRequest};
use crate::Ledger;

impl Ledger {
    /// Pay for a pending purchase owned by `user_id`.
    ///
    /// Returns the paid payment.
    ///
    /// # Errors
    ///
    /// - `BookstoreError::NotFound` if the purchase is absent, not owned, or not pending.
    /// - `BookstoreError::InvalidState` if another payment attempt is in
    ///   flight and its claim is younger than the claim lease.
    /// - `BookstoreError::PaymentDeclined` if settlement refused; the payment
    ///   is kept as `failed` and may be retried.
    /// - `BookstoreError::Unavailable` under sustained contention.
    pub async fn pay_purchase(
        &self,
        user_id: UserId,
        purchase_id: PurchaseId,
        payment_method: PaymentMethod,
    ) -> Result<Payment> {
        let (purchase, claimed) = self.claim_payment(user_id, purchase_id, payment_method).await?;
        let mut guard = ClaimGuard {
            ledger: self,
            claimed: Some(claimed.clone()),
        };

        let request = SettlementRequest::new(&purchase, &claimed);
        let outcome = self.settlement.authorize(&request).await;

        let settled = self.settle_payment(&claimed, &outcome).await;
        guard.disarm();
        let payment = settled?;
        match outcome {
            SettlementOutcome::Approved { .. } => {
                info!(
                    payment_id = %payment.id,
                    purchase_id = %purchase_id,
                    user_id = %user_id,
                    amount_cents = payment.amount_cents,
                    "payment settled, purchase processed"
                );
                Ok(payment)
            }
            SettlementOutcome::Declined { reason } => {
                warn!(
                    payment_id = %payment.id,
                    purchase_id = %purchase_id,
                    reason = %reason,
                    "payment declined"
                );
                Err(BookstoreError::PaymentDeclined { reason })
            }
        }
    }

    async fn claim_payment(
        &self,
        user_id: UserId,
        purchase_id: PurchaseId,
        payment_method: PaymentMethod,
    ) -> Result<(Purchase, Payment)> {
        let lease = self.claim_lease;
        self.run_in_transaction("claim_payment", |tx| {
            let mut purchase = tx
                .get_purchase(&purchase_id)?
                .filter(|p| p.is_owned_by(&user_id) && p.status == PurchaseStatus::Pending)
                .ok_or_else(|| BookstoreError::not_found("purchase", purchase_id))?;

            let mut payment = match tx.get_payment_by_purchase(&purchase_id)? {
                None => Payment::new(&purchase, payment_method),
                Some(mut existing) => match existing.status {
                    PaymentStatus::Failed => {
                        existing.retry(payment_method)?;
                        existing
                    }
                    PaymentStatus::Pending if existing.is_stale(lease) => {
                        warn!(
                            payment_id = %existing.id,
                            purchase_id = %purchase_id,
                            claimed_at = %existing.updated_at,
                            "taking over stale payment claim"
                        );
                        existing.reclaim(payment_method)?;
                        existing
                    }
                    PaymentStatus::Pending => {
                        return Err(BookstoreError::InvalidState(
                            "payment already in progress".into(),
                        ))
                    }
                    PaymentStatus::Paid => {
                        return Err(BookstoreError::InvalidState(
                            "purchase already paid".into(),
                        ))
                    }
                },
            };

            tx.put(&mut payment);
            // Cancellations guard on the purchase version.
            tx.put(&mut purchase);
            Ok((purchase, payment))
        })
        .await
    }

    async fn settle_payment(&self, claimed: &Payment, outcome: &SettlementOutcome) -> Result<Payment> {
        self.run_in_transaction("settle_payment", |tx| {
            let mut payment = tx
                .get_payment(&claimed.id)?
                .ok_or_else(|| BookstoreError::not_found("payment", claimed.id))?;
            if payment.version != claimed.version {
                return Err(BookstoreError::InvalidState(
                    "payment was modified while settling".into(),
                ));
            }

            match outcome {
                SettlementOutcome::Approved { reference } => {
                    let mut purchase = tx
                        .get_purchase(&claimed.purchase_id)?
                        .ok_or_else(|| BookstoreError::not_found("purchase", claimed.purchase_id))?;
                    payment.settle(reference.clone())?;
                    purchase.mark_processed()?;
                    tx.put(&mut purchase);
                }
                SettlementOutcome::Declined { reason } => {
                    payment.fail(reason.clone())?;
                }
            }
            tx.put(&mut payment);
            Ok(payment)
        })
        .await
    }

    /// Mark a claim as failed if nothing has touched it since it was made.
    ///
    /// Returns whether the claim was released.
    fn release_claim(&self, claimed: &Payment) -> Result<bool> {
        self.run_blocking("release_claim", |tx| {
            let Some(mut payment) = tx.get_payment(&claimed.id)? else {
                return Ok(false);
            };
            if payment.version != claimed.version || payment.status != PaymentStatus::Pending {
                return Ok(false);
            }
            payment.fail("payment attempt abandoned")?;
            tx.put(&mut payment);
            Ok(true)
        })
    }

    /// Payments of every purchase owned by `user_id`, oldest purchase first.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::Unavailable` if the store fails.
    pub async fn list_payments(&self, user_id: UserId) -> Result<Vec<Payment>> {
        self.run_in_transaction("list_payments", |tx| {
            let mut payments = Vec::new();
            for purchase in tx.list_purchases_by_user(&user_id)? {
                if let Some(payment) = tx.get_payment_by_purchase(&purchase.id)? {
                    payments.push(payment);
                }
            }
            Ok(payments)
        })
        .await
    }
}

/// Releases a payment claim whose settle step never ran.
struct ClaimGuard<'a> {
    ledger: &'a Ledger,
    claimed: Option<Payment>,
}

impl ClaimGuard<'_> {
    fn disarm(&mut self) {
        self.claimed = None;
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        let Some(claimed) = self.claimed.take() else {
            return;
        };
        match self.ledger.release_claim(&claimed) {
            Ok(true) => warn!(
                payment_id = %claimed.id,
                purchase_id = %claimed.purchase_id,
                "payment attempt abandoned, claim released"
            ),
            Ok(false) => {}
            Err(err) => warn!(
                payment_id = %claimed.id,
                error = %err,
                "failed to release abandoned payment claim"
            ),
        }
    }
}
