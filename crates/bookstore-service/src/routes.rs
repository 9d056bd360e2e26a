//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{books, health, payments, purchases, users};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent requests for API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /v1/books` - Search the catalog
/// - `GET /v1/books/:id` - Get a book
///
/// ## Users (JWT auth)
/// - `POST /v1/users/me` - Register profile
/// - `GET /v1/users/me` - Get profile
/// - `PUT /v1/users/me` - Edit profile
/// - `DELETE /v1/users/me` - Delete profile, purchases and payments
///
/// ## Purchases and payments (JWT auth)
/// - `POST /v1/purchases` - Reserve stock and open a purchase
/// - `GET /v1/purchases` - List purchases
/// - `GET /v1/purchases/:id` - Get a purchase
/// - `DELETE /v1/purchases/:id` - Cancel a pending purchase
/// - `POST /v1/payments` - Pay for a purchase
/// - `GET /v1/payments` - List payments
///
/// ## Catalog administration (Admin API key)
/// - `POST /v1/books` - Add a book
/// - `PUT /v1/books/:id` - Edit a book
/// - `DELETE /v1/books/:id` - Remove an unreferenced book
/// - `POST /v1/books/:id/stock` - Restock or write off
/// - `GET /v1/books/:id/stock` - Stock report
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Users
        .route(
            "/users/me",
            post(users::register_user)
                .get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        // Catalog
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route(
            "/books/:id/stock",
            get(books::stock_report).post(books::adjust_stock),
        )
        // Purchases
        .route(
            "/purchases",
            post(purchases::create_purchase).get(purchases::list_purchases),
        )
        .route(
            "/purchases/:id",
            get(purchases::get_purchase).delete(purchases::cancel_purchase),
        )
        // Payments
        .route(
            "/payments",
            post(payments::create_payment).get(payments::list_payments),
        )
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
