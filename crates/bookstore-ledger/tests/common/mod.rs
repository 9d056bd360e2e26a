//! Shared fixtures for ledger integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bookstore_core::{BookId, Genre, NewBook, UserId};
use bookstore_ledger::{AlwaysApprove, Ledger, Settlement, SettlementOutcome, SettlementRequest};
use bookstore_store::MemoryStore;
use chrono::NaiveDate;
use tokio::sync::Notify;

/// A ledger over a fresh in-memory store.
pub fn ledger_with(settlement: Arc<dyn Settlement>) -> Ledger {
    Ledger::new(Arc::new(MemoryStore::new()), settlement)
}

pub fn ledger() -> Ledger {
    ledger_with(Arc::new(AlwaysApprove))
}

pub async fn register(ledger: &Ledger, name: &str) -> UserId {
    let user_id = UserId::generate();
    let email = format!("{}@example.com", name.to_lowercase());
    ledger.register_user(user_id, name, &email).await.unwrap();
    user_id
}

/// Add a book priced at `price_cents` with `stock` units.
pub async fn stock_book(ledger: &Ledger, stock: u32, price_cents: i64) -> BookId {
    ledger
        .create_book(NewBook {
            title: "Dom Casmurro".into(),
            author: "Machado de Assis".into(),
            genre: Genre::Fiction,
            release_date: NaiveDate::from_ymd_opt(1899, 1, 1).unwrap(),
            price_cents,
            description: None,
            stock_quantity: stock,
        })
        .await
        .unwrap()
        .id
}

pub fn stock_of(ledger: &Ledger, book_id: BookId) -> u32 {
    ledger.get_book(book_id).unwrap().stock_quantity
}

/// Approves after a short delay, so concurrent callers overlap.
pub struct SlowApprove(pub Duration);

#[async_trait]
impl Settlement for SlowApprove {
    async fn authorize(&self, request: &SettlementRequest) -> SettlementOutcome {
        tokio::time::sleep(self.0).await;
        SettlementOutcome::Approved {
            reference: format!("slow-{}", request.payment_id),
        }
    }
}

/// Declines everything.
pub struct DeclineAll;

#[async_trait]
impl Settlement for DeclineAll {
    async fn authorize(&self, _request: &SettlementRequest) -> SettlementOutcome {
        SettlementOutcome::Declined {
            reason: "card expired".into(),
        }
    }
}

/// Blocks inside `authorize` until the test opens the gate.
#[derive(Default)]
pub struct GatedSettlement {
    pub entered: Notify,
    pub open: Notify,
}

#[async_trait]
impl Settlement for GatedSettlement {
    async fn authorize(&self, request: &SettlementRequest) -> SettlementOutcome {
        self.entered.notify_one();
        self.open.notified().await;
        SettlementOutcome::Approved {
            reference: format!("gated-{}", request.payment_id),
        }
    }
}
