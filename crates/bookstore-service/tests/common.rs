//! Common test utilities for bookstore integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;

use bookstore_core::UserId;
use bookstore_ledger::{Ledger, Settlement};
use bookstore_service::auth::JwtClaims;
use bookstore_service::{create_router, AppState, ServiceConfig};
use bookstore_store::MemoryStore;

const JWT_SECRET: &str = "test-jwt-secret";
const ADMIN_KEY: &str = "test-admin-key";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with an empty in-memory store.
    pub fn new() -> Self {
        Self::with_settlement(Arc::new(bookstore_ledger::AlwaysApprove))
    }

    /// Create a harness whose payments go through `settlement`.
    pub fn with_settlement(settlement: Arc<dyn Settlement>) -> Self {
        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: None,
            jwt_secret: JWT_SECRET.into(),
            admin_api_key: Some(ADMIN_KEY.into()),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            tx_max_attempts: 10,
            claim_lease_seconds: 120,
        };

        let ledger = Ledger::new(Arc::new(MemoryStore::new()), settlement)
            .with_max_attempts(config.tx_max_attempts);
        let state = AppState::new(ledger, config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            test_user_id: UserId::generate(),
        }
    }

    /// Get the authorization header for the test user.
    pub fn user_auth_header(&self) -> String {
        Self::auth_header_for(self.test_user_id)
    }

    /// Get a signed authorization header for any user.
    pub fn auth_header_for(user_id: UserId) -> String {
        let claims = JwtClaims {
            sub: user_id.to_string(),
            exp: chrono::Utc::now().timestamp() + 3600,
            iat: Some(chrono::Utc::now().timestamp()),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .expect("Failed to sign token");
        format!("Bearer {token}")
    }

    /// Get the admin key header value.
    pub fn admin_key_header(&self) -> String {
        ADMIN_KEY.to_string()
    }

    /// Register the test user's profile.
    pub async fn register(&self) {
        self.register_as(&self.user_auth_header(), "Ana").await;
    }

    /// Register a profile for the user behind `auth_header`.
    pub async fn register_as(&self, auth_header: &str, name: &str) {
        self.server
            .post("/v1/users/me")
            .add_header("authorization", auth_header.to_string())
            .json(&json!({
                "name": name,
                "email": format!("{}@example.com", name.to_lowercase())
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
    }

    /// Add a book through the admin API and return its ID.
    pub async fn add_book(&self, stock: u32, price_cents: i64) -> String {
        let response = self
            .server
            .post("/v1/books")
            .add_header("x-admin-key", self.admin_key_header())
            .json(&json!({
                "title": "Dom Casmurro",
                "author": "Machado de Assis",
                "genre": "fiction",
                "release_date": "1899-01-01",
                "price_cents": price_cents,
                "stock_quantity": stock
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        body["id"].as_str().expect("book id").to_string()
    }

    /// Open a purchase for the test user and return its ID.
    pub async fn buy(&self, book_id: &str, quantity: u32) -> String {
        let response = self
            .server
            .post("/v1/purchases")
            .add_header("authorization", self.user_auth_header())
            .json(&json!({ "book_id": book_id, "quantity": quantity }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        body["id"].as_str().expect("purchase id").to_string()
    }

    /// Current shelf stock of a book.
    pub async fn stock_of(&self, book_id: &str) -> u64 {
        let response = self.server.get(&format!("/v1/books/{book_id}")).await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["stock_quantity"].as_u64().expect("stock quantity")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
