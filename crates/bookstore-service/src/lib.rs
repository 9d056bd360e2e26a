//! Bookstore HTTP API Service.
//!
//! This crate exposes the [`bookstore_ledger::Ledger`] over HTTP:
//!
//! - User profiles
//! - Catalog browsing and administration
//! - Purchases and payments
//!
//! # Authentication
//!
//! The service supports two authentication methods:
//!
//! 1. **HS256 JWT bearer tokens** - For customers. The `sub` claim is the user UUID.
//! 2. **Admin API key** - For catalog administration, sent as `X-Admin-Key`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Axum requires async handlers

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
