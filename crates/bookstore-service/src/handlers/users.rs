//! User profile handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use bookstore_core::{User, UserPatch};
use bookstore_ledger::AccountWipe;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// User profile response.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Created timestamp.
    pub created_at: String,
    /// Updated timestamp.
    pub updated_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// Register profile request.
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
}

/// Create the caller's profile.
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state
        .ledger
        .register_user(auth.user_id, &body.name, &body.email)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Get the caller's profile.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.ledger.get_user(auth.user_id)?;
    Ok(Json(UserResponse::from(&user)))
}

/// Edit the caller's profile.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(patch): Json<UserPatch>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.ledger.update_user(auth.user_id, patch).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// Delete the caller's profile together with their purchases and payments.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<AccountWipe>, ApiError> {
    let wipe = state.ledger.delete_user(auth.user_id).await?;
    Ok(Json(wipe))
}
