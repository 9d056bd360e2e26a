//! API handlers.

pub mod books;
pub mod health;
pub mod payments;
pub mod purchases;
pub mod users;

use std::str::FromStr;

use bookstore_core::IdError;

use crate::error::ApiError;

/// Parse an identifier taken from the request path.
pub(crate) fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = IdError>,
{
    raw.parse()
        .map_err(|e: IdError| ApiError::BadRequest(format!("{e}: {raw}")))
}
