//! Purchase integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

use bookstore_core::UserId;

#[tokio::test]
async fn purchase_reserves_stock_and_freezes_total() {
    let harness = TestHarness::new();
    harness.register().await;
    let book_id = harness.add_book(5, 1000).await;

    let response = harness
        .server
        .post("/v1/purchases")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "book_id": book_id, "quantity": 3 }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["total_price_cents"], 3000);
    assert_eq!(body["total_price_formatted"], "30.00");
    assert_eq!(harness.stock_of(&book_id).await, 2);
}

#[tokio::test]
async fn purchase_beyond_stock_fails() {
    let harness = TestHarness::new();
    harness.register().await;
    let book_id = harness.add_book(2, 1000).await;

    let response = harness
        .server
        .post("/v1/purchases")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "book_id": book_id, "quantity": 3 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_stock");
    assert_eq!(body["error"]["details"]["available"], 2);
    assert_eq!(harness.stock_of(&book_id).await, 2);
}

#[tokio::test]
async fn non_positive_quantity_is_rejected() {
    let harness = TestHarness::new();
    harness.register().await;
    let book_id = harness.add_book(5, 1000).await;

    for quantity in [0, -1] {
        harness
            .server
            .post("/v1/purchases")
            .add_header("authorization", harness.user_auth_header())
            .json(&json!({ "book_id": book_id, "quantity": quantity }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
    assert_eq!(harness.stock_of(&book_id).await, 5);
}

#[tokio::test]
async fn purchase_requires_a_profile() {
    let harness = TestHarness::new();
    let book_id = harness.add_book(5, 1000).await;

    harness
        .server
        .post("/v1/purchases")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "book_id": book_id, "quantity": 1 }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_shows_book_and_payment() {
    let harness = TestHarness::new();
    harness.register().await;
    let book_id = harness.add_book(5, 1000).await;
    let paid = harness.buy(&book_id, 1).await;
    harness.buy(&book_id, 2).await;
    harness
        .server
        .post("/v1/payments")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "purchase_id": paid, "payment_method": "credit_card" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = harness
        .server
        .get("/v1/purchases")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: Vec<serde_json::Value> = response.json();
    assert_eq!(body.len(), 2);
    let (processed, pending): (Vec<_>, Vec<_>) = body.iter().partition(|p| p["id"] == paid);
    assert_eq!(processed[0]["status"], "processed");
    assert_eq!(processed[0]["book"]["title"], "Dom Casmurro");
    assert_eq!(processed[0]["payment"]["status"], "paid");
    assert_eq!(pending[0]["status"], "pending");
    assert!(pending[0].get("payment").is_none());
}

#[tokio::test]
async fn other_users_purchases_are_invisible() {
    let harness = TestHarness::new();
    harness.register().await;
    let book_id = harness.add_book(5, 1000).await;
    let purchase_id = harness.buy(&book_id, 1).await;

    let stranger = TestHarness::auth_header_for(UserId::generate());
    harness.register_as(&stranger, "Bia").await;

    harness
        .server
        .get(&format!("/v1/purchases/{purchase_id}"))
        .add_header("authorization", stranger.clone())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    harness
        .server
        .delete(&format!("/v1/purchases/{purchase_id}"))
        .add_header("authorization", stranger)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    assert_eq!(harness.stock_of(&book_id).await, 4);
}

#[tokio::test]
async fn cancelling_restores_stock() {
    let harness = TestHarness::new();
    harness.register().await;
    let book_id = harness.add_book(5, 1000).await;
    let purchase_id = harness.buy(&book_id, 3).await;

    harness
        .server
        .delete(&format!("/v1/purchases/{purchase_id}"))
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert_eq!(harness.stock_of(&book_id).await, 5);
    harness
        .server
        .get(&format!("/v1/purchases/{purchase_id}"))
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn paid_purchase_cannot_be_cancelled() {
    let harness = TestHarness::new();
    harness.register().await;
    let book_id = harness.add_book(5, 1000).await;
    let purchase_id = harness.buy(&book_id, 3).await;
    harness
        .server
        .post("/v1/payments")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "purchase_id": purchase_id, "payment_method": "credit_card" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = harness
        .server
        .delete(&format!("/v1/purchases/{purchase_id}"))
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "invalid_state");
    assert_eq!(harness.stock_of(&book_id).await, 2);
}
