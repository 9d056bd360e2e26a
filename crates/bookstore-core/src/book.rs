//! Catalog types.
//!
//! A [`Book`] carries the only hot shared counter in the system,
//! `stock_quantity`. Purchases reserve units with [`Book::reserve`] and
//! cancellations hand them back with [`Book::release`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BookstoreError, Result};
use crate::BookId;

/// A book in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Book identifier.
    pub id: BookId,

    /// Title.
    pub title: String,

    /// Author.
    pub author: String,

    /// Genre.
    pub genre: Genre,

    /// Release date.
    pub release_date: NaiveDate,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Optional blurb.
    pub description: Option<String>,

    /// Units on the shelf, not reserved by any purchase.
    pub stock_quantity: u32,

    /// When the book was added to the catalog.
    pub created_at: DateTime<Utc>,

    /// When the book was last modified.
    pub updated_at: DateTime<Utc>,

    /// Record version (0 = never stored).
    pub version: u64,
}

impl Book {
    /// Build an unsaved book from validated input.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::Validation` if the input is malformed.
    pub fn new(input: NewBook) -> Result<Self> {
        input.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: BookId::generate(),
            title: input.title.trim().to_string(),
            author: input.author.trim().to_string(),
            genre: input.genre,
            release_date: input.release_date,
            price_cents: input.price_cents,
            description: input.description,
            stock_quantity: input.stock_quantity,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Take `quantity` units off the shelf for a purchase.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::InsufficientStock` if fewer units are available.
    pub fn reserve(&mut self, quantity: u32) -> Result<()> {
        if quantity > self.stock_quantity {
            return Err(BookstoreError::InsufficientStock {
                book_id: self.id.to_string(),
                available: self.stock_quantity,
                requested: quantity,
            });
        }
        self.stock_quantity -= quantity;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Put `quantity` previously reserved units back on the shelf.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::Validation` if the counter would overflow.
    pub fn release(&mut self, quantity: u32) -> Result<()> {
        self.stock_quantity = self
            .stock_quantity
            .checked_add(quantity)
            .ok_or_else(|| BookstoreError::Validation("stock quantity overflow".into()))?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Apply a signed stock correction (restock or write-off).
    ///
    /// Returns the new stock quantity.
    ///
    /// # Errors
    ///
    /// - `BookstoreError::InsufficientStock` if the result would be negative.
    /// - `BookstoreError::Validation` if the result would overflow.
    pub fn adjust_stock(&mut self, delta: i64) -> Result<u32> {
        let next = i64::from(self.stock_quantity) + delta;
        if next < 0 {
            return Err(BookstoreError::InsufficientStock {
                book_id: self.id.to_string(),
                available: self.stock_quantity,
                requested: u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX),
            });
        }
        self.stock_quantity = u32::try_from(next)
            .map_err(|_| BookstoreError::Validation("stock quantity overflow".into()))?;
        self.updated_at = Utc::now();
        Ok(self.stock_quantity)
    }

    /// Total price of `quantity` units at the current price.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::Validation` on overflow.
    pub fn price_for(&self, quantity: u32) -> Result<i64> {
        self.price_cents
            .checked_mul(i64::from(quantity))
            .ok_or_else(|| BookstoreError::Validation("total price overflow".into()))
    }

    /// Apply an edit. Stock is not editable here; use [`Book::adjust_stock`].
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::Validation` if the edited book is malformed.
    pub fn apply(&mut self, patch: BookPatch) -> Result<()> {
        if let Some(title) = patch.title {
            require_text("title", &title)?;
            self.title = title.trim().to_string();
        }
        if let Some(author) = patch.author {
            require_text("author", &author)?;
            self.author = author.trim().to_string();
        }
        if let Some(genre) = patch.genre {
            self.genre = genre;
        }
        if let Some(release_date) = patch.release_date {
            self.release_date = release_date;
        }
        if let Some(price_cents) = patch.price_cents {
            require_price(price_cents)?;
            self.price_cents = price_cents;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Book genres offered by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    /// Fiction.
    Fiction,
    /// Romance.
    Romance,
    /// Fantasy.
    Fantasy,
    /// Science.
    Science,
    /// Anything else.
    Other,
}

/// Input for adding a book to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Genre.
    pub genre: Genre,
    /// Release date.
    pub release_date: NaiveDate,
    /// Unit price in cents.
    pub price_cents: i64,
    /// Optional blurb.
    #[serde(default)]
    pub description: Option<String>,
    /// Initial stock.
    #[serde(default)]
    pub stock_quantity: u32,
}

impl NewBook {
    /// Check the input.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::Validation` for empty text or a negative price.
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)?;
        require_text("author", &self.author)?;
        require_price(self.price_cents)
    }
}

/// Partial edit of a book. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookPatch {
    /// New title.
    pub title: Option<String>,
    /// New author.
    pub author: Option<String>,
    /// New genre.
    pub genre: Option<Genre>,
    /// New release date.
    pub release_date: Option<NaiveDate>,
    /// New unit price in cents. Existing purchases keep their totals.
    pub price_cents: Option<i64>,
    /// New blurb.
    pub description: Option<String>,
}

/// Catalog search criteria. Every populated field must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookFilter {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Exact genre.
    pub genre: Option<Genre>,
    /// Released on or after.
    pub released_from: Option<NaiveDate>,
    /// Released on or before.
    pub released_to: Option<NaiveDate>,
    /// Minimum unit price in cents.
    pub min_price_cents: Option<i64>,
    /// Maximum unit price in cents.
    pub max_price_cents: Option<i64>,
}

impl BookFilter {
    /// Whether `book` satisfies every populated criterion.
    #[must_use]
    pub fn matches(&self, book: &Book) -> bool {
        let title_ok = self.title.as_ref().map_or(true, |needle| {
            book.title
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });
        title_ok
            && self.genre.map_or(true, |g| book.genre == g)
            && self.released_from.map_or(true, |d| book.release_date >= d)
            && self.released_to.map_or(true, |d| book.release_date <= d)
            && self.min_price_cents.map_or(true, |p| book.price_cents >= p)
            && self.max_price_cents.map_or(true, |p| book.price_cents <= p)
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BookstoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_price(price_cents: i64) -> Result<()> {
    if price_cents < 0 {
        return Err(BookstoreError::Validation("price must not be negative".into()));
    }
    Ok(())
}
