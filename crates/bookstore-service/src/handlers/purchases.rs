//! Purchase handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use bookstore_core::{format_cents, Purchase, PurchaseId, PurchaseStatus};
use bookstore_ledger::{BookSummary, PaymentSummary, PurchaseView};

use super::parse_id;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Purchase response.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// Purchase ID.
    pub id: String,
    /// Purchased book ID.
    pub book_id: String,
    /// Units purchased.
    pub quantity: u32,
    /// Total frozen at creation, in cents.
    pub total_price_cents: i64,
    /// Total formatted with two decimals.
    pub total_price_formatted: String,
    /// Lifecycle status.
    pub status: PurchaseStatus,
    /// Created timestamp.
    pub created_at: String,
    /// Updated timestamp.
    pub updated_at: String,
    /// Book details, while the book is in the catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book: Option<BookSummary>,
    /// Payment details, once a payment was attempted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentSummary>,
}

impl From<&Purchase> for PurchaseResponse {
    fn from(purchase: &Purchase) -> Self {
        Self {
            id: purchase.id.to_string(),
            book_id: purchase.book_id.to_string(),
            quantity: purchase.quantity,
            total_price_cents: purchase.total_price_cents,
            total_price_formatted: format_cents(purchase.total_price_cents),
            status: purchase.status,
            created_at: purchase.created_at.to_rfc3339(),
            updated_at: purchase.updated_at.to_rfc3339(),
            book: None,
            payment: None,
        }
    }
}

impl From<PurchaseView> for PurchaseResponse {
    fn from(view: PurchaseView) -> Self {
        Self {
            book: view.book,
            payment: view.payment,
            ..Self::from(&view.purchase)
        }
    }
}

/// Create purchase request.
#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    /// Book to buy.
    pub book_id: String,
    /// Units to buy.
    pub quantity: i64,
}

/// Reserve stock and open a pending purchase.
pub async fn create_purchase(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreatePurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), ApiError> {
    let quantity = u32::try_from(body.quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| ApiError::BadRequest("quantity must be a positive integer".into()))?;

    let purchase = state
        .ledger
        .create_purchase(auth.user_id, parse_id(&body.book_id)?, quantity)
        .await?;

    Ok((StatusCode::CREATED, Json(PurchaseResponse::from(&purchase))))
}

/// List the caller's purchases.
pub async fn list_purchases(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<PurchaseResponse>>, ApiError> {
    let views = state.ledger.list_purchases(auth.user_id).await?;
    Ok(Json(views.into_iter().map(PurchaseResponse::from).collect()))
}

/// Get one of the caller's purchases.
pub async fn get_purchase(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(purchase_id): Path<String>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let view = state
        .ledger
        .get_purchase(auth.user_id, parse_id(&purchase_id)?)
        .await?;
    Ok(Json(PurchaseResponse::from(view)))
}

/// Cancel a pending purchase and put its units back on the shelf.
pub async fn cancel_purchase(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(purchase_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let purchase_id: PurchaseId = parse_id(&purchase_id)?;
    state
        .ledger
        .cancel_purchase(auth.user_id, purchase_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
