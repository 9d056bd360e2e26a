//! Core types and state transitions for the bookstore.
//!
//! This crate provides the domain records shared by every other crate:
//!
//! - **Identifiers**: `UserId`, `BookId`, `PurchaseId`, `PaymentId`
//! - **Catalog**: `Book`, `Genre`, `NewBook`, `BookPatch`, `BookFilter`
//! - **Purchases**: `Purchase`, `PurchaseStatus`
//! - **Payments**: `Payment`, `PaymentMethod`, `PaymentStatus`
//! - **Users**: `User`, `UserPatch`
//!
//! # Money
//!
//! Prices are fixed point with two decimals and stored as `i64` integer cents:
//! a book priced at 10.00 has `price_cents == 1000`.
//!
//! # Versions
//!
//! Every record carries a `version`. Zero means the record has never been
//! stored; each successful write increments it by one. Stores reject writes
//! whose version does not follow the stored one.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod book;
pub mod error;
pub mod ids;
pub mod money;
pub mod payment;
pub mod purchase;
pub mod user;

pub use book::{Book, BookFilter, BookPatch, Genre, NewBook};
pub use error::{BookstoreError, Result};
pub use ids::{BookId, IdError, PaymentId, PurchaseId, UserId};
pub use money::format_cents;
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use purchase::{Purchase, PurchaseStatus};
pub use user::{User, UserPatch};
