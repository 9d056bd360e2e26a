//! Catalog handlers.
//!
//! Browsing is public. Every write goes through [`AdminAuth`].

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use bookstore_core::{format_cents, Book, BookFilter, BookId, BookPatch, Genre, NewBook};
use bookstore_ledger::StockReport;

use super::parse_id;
use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Book response.
#[derive(Debug, Serialize)]
pub struct BookResponse {
    /// Book ID.
    pub id: String,
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Genre.
    pub genre: Genre,
    /// Release date (YYYY-MM-DD).
    pub release_date: String,
    /// Unit price in cents.
    pub price_cents: i64,
    /// Unit price formatted with two decimals.
    pub price_formatted: String,
    /// Optional blurb.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Units available for purchase.
    pub stock_quantity: u32,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&Book> for BookResponse {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.to_string(),
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre,
            release_date: book.release_date.to_string(),
            price_cents: book.price_cents,
            price_formatted: format_cents(book.price_cents),
            description: book.description.clone(),
            stock_quantity: book.stock_quantity,
            created_at: book.created_at.to_rfc3339(),
        }
    }
}

/// Stock adjustment request.
#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    /// Units to add (positive) or write off (negative).
    pub delta: i64,
}

/// Search the catalog.
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<BookFilter>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = state.ledger.search_books(&filter)?;
    Ok(Json(books.iter().map(BookResponse::from).collect()))
}

/// Get one book.
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state.ledger.get_book(parse_id::<BookId>(&book_id)?)?;
    Ok(Json(BookResponse::from(&book)))
}

/// Add a book to the catalog (admin only).
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(body): Json<NewBook>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let book = state.ledger.create_book(body).await?;

    tracing::info!(admin_id = %admin.admin_id, book_id = %book.id, "Admin added book");

    Ok((StatusCode::CREATED, Json(BookResponse::from(&book))))
}

/// Edit a book (admin only).
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(book_id): Path<String>,
    Json(patch): Json<BookPatch>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state
        .ledger
        .update_book(parse_id(&book_id)?, patch)
        .await?;

    tracing::info!(admin_id = %admin.admin_id, book_id = %book.id, "Admin edited book");

    Ok(Json(BookResponse::from(&book)))
}

/// Remove a book (admin only).
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(book_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let book_id: BookId = parse_id(&book_id)?;
    state.ledger.delete_book(book_id).await?;

    tracing::info!(admin_id = %admin.admin_id, book_id = %book_id, "Admin removed book");

    Ok(StatusCode::NO_CONTENT)
}

/// Restock or write off units (admin only).
pub async fn adjust_stock(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(book_id): Path<String>,
    Json(body): Json<AdjustStockRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state
        .ledger
        .adjust_stock(parse_id(&book_id)?, body.delta)
        .await?;

    tracing::info!(
        admin_id = %admin.admin_id,
        book_id = %book.id,
        delta = body.delta,
        "Admin adjusted stock"
    );

    Ok(Json(BookResponse::from(&book)))
}

/// Where every unit of a book is (admin only).
pub async fn stock_report(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Path(book_id): Path<String>,
) -> Result<Json<StockReport>, ApiError> {
    let report = state.ledger.stock_report(parse_id(&book_id)?).await?;
    Ok(Json(report))
}
