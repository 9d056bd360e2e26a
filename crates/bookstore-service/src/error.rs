//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use bookstore_core::BookstoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - valid credentials but insufficient permissions.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found (or owned by someone else).
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Not enough units on the shelf.
    #[error("insufficient stock: available={available}, requested={requested}")]
    InsufficientStock {
        /// The book.
        book_id: String,
        /// Units on the shelf.
        available: u32,
        /// Units requested.
        requested: u32,
    },

    /// The operation is not allowed in the record's current status.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Settlement declined the payment.
    #[error("payment declined: {0}")]
    PaymentDeclined(String),

    /// Conflict - resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Too much contention or the store is down.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::InsufficientStock {
                book_id,
                available,
                requested,
            } => (
                StatusCode::BAD_REQUEST,
                "insufficient_stock",
                self.to_string(),
                Some(serde_json::json!({
                    "book_id": book_id,
                    "available": available,
                    "requested": requested
                })),
            ),
            Self::InvalidState(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_state",
                msg.clone(),
                None,
            ),
            Self::PaymentDeclined(reason) => (
                StatusCode::PAYMENT_REQUIRED,
                "payment_declined",
                self.to_string(),
                Some(serde_json::json!({ "reason": reason })),
            ),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable",
                    "The service is busy, retry later".to_string(),
                    None,
                )
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<BookstoreError> for ApiError {
    fn from(err: BookstoreError) -> Self {
        match err {
            BookstoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            BookstoreError::InsufficientStock {
                book_id,
                available,
                requested,
            } => Self::InsufficientStock {
                book_id,
                available,
                requested,
            },
            BookstoreError::InvalidState(msg) => Self::InvalidState(msg),
            BookstoreError::Validation(msg) => Self::BadRequest(msg),
            BookstoreError::InvalidId(e) => Self::BadRequest(e.to_string()),
            BookstoreError::PaymentDeclined { reason } => Self::PaymentDeclined(reason),
            BookstoreError::AlreadyExists { .. } => Self::Conflict(err.to_string()),
            BookstoreError::Unavailable(msg) => Self::Unavailable(msg),
            BookstoreError::Storage(msg) => Self::Internal(msg),
        }
    }
}
