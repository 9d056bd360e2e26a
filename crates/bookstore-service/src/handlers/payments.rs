//! Payment handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use bookstore_core::{format_cents, Payment, PaymentMethod, PaymentStatus};

use super::parse_id;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Payment response.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    /// Payment ID.
    pub id: String,
    /// Purchase paid for.
    pub purchase_id: String,
    /// Method used.
    pub payment_method: PaymentMethod,
    /// Settlement status.
    pub status: PaymentStatus,
    /// Amount in cents.
    pub amount_cents: i64,
    /// Amount formatted with two decimals.
    pub amount_formatted: String,
    /// Settlement reference, once paid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_reference: Option<String>,
    /// Decline reason of the last attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id.to_string(),
            purchase_id: payment.purchase_id.to_string(),
            payment_method: payment.payment_method,
            status: payment.status,
            amount_cents: payment.amount_cents,
            amount_formatted: format_cents(payment.amount_cents),
            settlement_reference: payment.settlement_reference.clone(),
            failure_reason: payment.failure_reason.clone(),
            created_at: payment.created_at.to_rfc3339(),
        }
    }
}

/// Pay purchase request.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    /// Purchase to pay for.
    pub purchase_id: String,
    /// How to pay.
    pub payment_method: PaymentMethod,
}

/// Pay for a pending purchase.
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let payment = state
        .ledger
        .pay_purchase(auth.user_id, parse_id(&body.purchase_id)?, body.payment_method)
        .await?;

    Ok((StatusCode::CREATED, Json(PaymentResponse::from(&payment))))
}

/// List payments of the caller's purchases.
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    let payments = state.ledger.list_payments(auth.user_id).await?;
    Ok(Json(payments.iter().map(PaymentResponse::from).collect()))
}
