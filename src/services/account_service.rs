//! Domain service for time-boxed accounts.
//!
//! Handles creation, credential validation, extension, deactivation and
//! removal of accounts, plus listing with derived status.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db::StoreError;
use crate::models::{AccountSummary, AccountView, ValidatedSession};
use crate::services::hasher::HashError;

/// Why a credential check was rejected.
///
/// An unknown username and a wrong secret share [`AuthFailure::InvalidCredentials`]
/// so callers cannot probe which usernames exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account deactivated")]
    Deactivated,

    #[error("account expired")]
    Expired,
}

impl AuthFailure {
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Invalid username or password",
            Self::Deactivated => "Account has been deactivated",
            Self::Expired => "Account has expired",
        }
    }
}

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),

    #[error("Username '{0}' already exists")]
    Duplicate(String),

    #[error("User '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Auth(#[from] AuthFailure),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Hashing error: {0}")]
    Hashing(#[from] HashError),
}

impl AccountError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Storage and hashing failures are not the caller's fault.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Hashing(_))
    }
}

/// Domain service trait for account lifecycle.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Creates an active account expiring `expiration_days` from now.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Validation`] for a short username/secret or a
    /// non-positive lifetime, and [`AccountError::Duplicate`] when the
    /// case-insensitive username is taken.
    async fn create(
        &self,
        username: &str,
        secret: &str,
        expiration_days: i64,
        created_by: &str,
    ) -> Result<AccountSummary, AccountError>;

    /// Checks credentials and reports the remaining validity window.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Auth`] when the account is unknown, inactive,
    /// expired, or the secret does not match.
    async fn validate(&self, username: &str, secret: &str)
    -> Result<ValidatedSession, AccountError>;

    /// Pushes expiry to `max(current expiry, now) + days` and reactivates.
    async fn extend(&self, username: &str, days: i64) -> Result<DateTime<Utc>, AccountError>;

    /// Soft-deletes the account. Calling it twice is not an error.
    async fn deactivate(&self, username: &str) -> Result<(), AccountError>;

    /// Removes the account permanently.
    async fn delete(&self, username: &str) -> Result<(), AccountError>;

    async fn list(&self) -> Result<Vec<AccountView>, AccountError>;

    async fn get(&self, username: &str) -> Result<Option<AccountView>, AccountError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_display() {
        assert_eq!(
            AuthFailure::InvalidCredentials.to_string(),
            "invalid credentials"
        );
        assert_eq!(AuthFailure::Deactivated.to_string(), "account deactivated");
        assert_eq!(AuthFailure::Expired.to_string(), "account expired");
    }

    #[test]
    fn account_error_display() {
        let err = AccountError::from(AuthFailure::Expired);
        assert_eq!(err.to_string(), "account expired");

        let err = AccountError::Duplicate("alice".to_string());
        assert_eq!(err.to_string(), "Username 'alice' already exists");
        assert!(!err.is_internal());

        let err = AccountError::from(StoreError::Unavailable("disk".to_string()));
        assert!(err.is_internal());
    }
}
