//! User profiles and account wipes.

use serde::Serialize;
use tracing::{info, warn};

use bookstore_core::{BookstoreError, Result, User, UserId, UserPatch};

use crate::Ledger;

/// What an account wipe removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountWipe {
    /// Purchases deleted.
    pub purchases_removed: usize,
    /// Payments deleted.
    pub payments_removed: usize,
    /// Units held by the deleted purchases that were not put back on the shelf.
    pub unreleased_units: u64,
}

impl Ledger {
    /// Create the profile for an authenticated user.
    ///
    /// # Errors
    ///
    /// - `BookstoreError::AlreadyExists` if the user already has a profile.
    /// - `BookstoreError::Validation` if the name or email is malformed.
    pub async fn register_user(
        &self,
        user_id: UserId,
        name: &str,
        email: &str,
    ) -> Result<User> {
        let user = self
            .run_in_transaction("register_user", |tx| {
                if tx.get_user(&user_id)?.is_some() {
                    return Err(BookstoreError::AlreadyExists {
                        entity: "user",
                        id: user_id.to_string(),
                    });
                }
                let mut user = User::new(user_id, name, email)?;
                tx.put(&mut user);
                Ok(user)
            })
            .await?;

        info!(user_id = %user_id, "user registered");
        Ok(user)
    }

    /// Fetch a profile.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::NotFound` if the user has no profile.
    pub fn get_user(&self, user_id: UserId) -> Result<User> {
        self.store
            .get_user(&user_id)?
            .ok_or_else(|| BookstoreError::not_found("user", user_id))
    }

    /// Edit a profile.
    ///
    /// # Errors
    ///
    /// - `BookstoreError::NotFound` if the user has no profile.
    /// - `BookstoreError::Validation` if an edited field is malformed.
    pub async fn update_user(&self, user_id: UserId, patch: UserPatch) -> Result<User> {
        self.run_in_transaction("update_user", |tx| {
            let mut user = tx
                .get_user(&user_id)?
                .ok_or_else(|| BookstoreError::not_found("user", user_id))?;
            user.apply(patch.clone())?;
            tx.put(&mut user);
            Ok(user)
        })
        .await
    }

    /// Delete a user with every purchase and payment they own.
    ///
    /// Stock held by the deleted purchases is not restored.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::NotFound` if the user has no profile.
    pub async fn delete_user(&self, user_id: UserId) -> Result<AccountWipe> {
        let wipe = self
            .run_in_transaction("delete_user", |tx| {
                let user = tx
                    .get_user(&user_id)?
                    .ok_or_else(|| BookstoreError::not_found("user", user_id))?;

                let mut wipe = AccountWipe {
                    purchases_removed: 0,
                    payments_removed: 0,
                    unreleased_units: 0,
                };
                let purchases = tx.list_purchases_by_user(&user_id)?;
                for purchase in &purchases {
                    if let Some(payment) = tx.get_payment_by_purchase(&purchase.id)? {
                        tx.delete(&payment);
                        wipe.payments_removed += 1;
                    }
                }
                for purchase in &purchases {
                    if purchase.holds_stock() {
                        wipe.unreleased_units += u64::from(purchase.quantity);
                    }
                    tx.delete(purchase);
                    wipe.purchases_removed += 1;
                }
                tx.delete(&user);
                Ok(wipe)
            })
            .await?;

        if wipe.unreleased_units > 0 {
            warn!(
                user_id = %user_id,
                units = wipe.unreleased_units,
                "account wipe left stock unreleased"
            );
        }
        info!(
            user_id = %user_id,
            purchases = wipe.purchases_removed,
            payments = wipe.payments_removed,
            "user deleted"
        );
        Ok(wipe)
    }
}
