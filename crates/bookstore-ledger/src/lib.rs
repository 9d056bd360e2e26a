//! Purchase, stock and payment consistency core.
//!
//! The [`Ledger`] is the only component that mutates stored records. Every
//! operation runs as a unit of work (see [`transaction`]): reads are
//! recorded with their versions, writes are staged, and the whole set is
//! committed atomically or retried from scratch on conflict.
//!
//! # Invariants
//!
//! For every book, `stock_quantity` plus the quantities of its pending and
//! processed purchases stays constant across purchase creation, payment and
//! cancellation. A purchase has at most one payment; a processed purchase
//! has exactly one paid payment; a cancelled purchase never had one.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bookstore_ledger::{AlwaysApprove, Ledger};
//! use bookstore_store::MemoryStore;
//!
//! let ledger = Ledger::new(Arc::new(MemoryStore::new()), Arc::new(AlwaysApprove));
//! assert_eq!(ledger.max_attempts(), bookstore_ledger::DEFAULT_MAX_ATTEMPTS);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod accounts;
pub mod catalog;
pub mod payments;
pub mod purchases;
pub mod settlement;
pub mod transaction;
pub mod views;

use std::sync::Arc;
use std::time::Duration;

use bookstore_store::Store;

pub use accounts::AccountWipe;
pub use catalog::StockReport;
pub use purchases::Cancellation;
pub use settlement::{AlwaysApprove, Settlement, SettlementOutcome, SettlementRequest};
pub use transaction::Transaction;
pub use views::{BookSummary, PaymentSummary, PurchaseView};

/// Default number of attempts for a unit of work before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default age after which a pending payment claim may be taken over.
pub const DEFAULT_CLAIM_LEASE: Duration = Duration::from_secs(120);

/// Entry point for every bookstore operation.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn Store>,
    settlement: Arc<dyn Settlement>,
    max_attempts: u32,
    claim_lease: Duration,
}

impl Ledger {
    /// Create a ledger over a store and a settlement capability.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, settlement: Arc<dyn Settlement>) -> Self {
        Self {
            store,
            settlement,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            claim_lease: DEFAULT_CLAIM_LEASE,
        }
    }

    /// Override how many times a conflicting unit of work is retried.
    ///
    /// Values below 1 are treated as 1.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Override how long a pending payment claim holds before another
    /// attempt may take it over.
    #[must_use]
    pub fn with_claim_lease(mut self, claim_lease: Duration) -> Self {
        self.claim_lease = claim_lease;
        self
    }

    /// How long a pending payment claim holds.
    #[must_use]
    pub const fn claim_lease(&self) -> Duration {
        self.claim_lease
    }

    /// Attempts per unit of work.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }
}
