//! User profiles.
//!
//! Credentials live with the identity provider; the bookstore only keeps
//! the profile that purchases hang off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BookstoreError, Result};
use crate::UserId;

/// A customer profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user ID (from the identity token).
    pub id: UserId,

    /// Display name.
    pub name: String,

    /// Contact email.
    pub email: String,

    /// When the profile was created.
    pub created_at: DateTime<Utc>,

    /// When the profile was last modified.
    pub updated_at: DateTime<Utc>,

    /// Record version (0 = never stored).
    pub version: u64,
}

impl User {
    /// Create an unsaved profile.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::Validation` for a blank name or malformed email.
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let email = email.into();
        validate_name(&name)?;
        validate_email(&email)?;
        let now = Utc::now();
        Ok(Self {
            id,
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Apply a profile edit.
    ///
    /// # Errors
    ///
    /// Returns `BookstoreError::Validation` if an edited field is malformed.
    pub fn apply(&mut self, patch: UserPatch) -> Result<()> {
        if let Some(name) = patch.name {
            validate_name(&name)?;
            self.name = name.trim().to_string();
        }
        if let Some(email) = patch.email {
            validate_email(&email)?;
            self.email = email.trim().to_string();
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Partial edit of a profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    /// New display name.
    pub name: Option<String>,
    /// New email.
    pub email: Option<String>,
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(BookstoreError::Validation("name must not be empty".into()));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(BookstoreError::Validation(format!("invalid email: {email}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_trims_fields() {
        let user = User::new(UserId::generate(), " Ana ", "ana@example.com ").unwrap();
        assert_eq!(user.name, "Ana");
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.version, 0);
    }

    #[test]
    fn rejects_bad_email() {
        assert!(User::new(UserId::generate(), "Ana", "ana").is_err());
        assert!(User::new(UserId::generate(), "Ana", "@example.com").is_err());
    }

    #[test]
    fn patch_updates_only_given_fields() {
        let mut user = User::new(UserId::generate(), "Ana", "ana@example.com").unwrap();
        user.apply(UserPatch {
            name: Some("Ana Maria".into()),
            email: None,
        })
        .unwrap();
        assert_eq!(user.name, "Ana Maria");
        assert_eq!(user.email, "ana@example.com");
    }
}
