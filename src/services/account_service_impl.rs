//! Store-backed implementation of the `AccountService` trait.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::info;
use uuid::Uuid;

use crate::constants::accounts::{EXPIRING_SOON_DAYS, MIN_SECRET_LEN, MIN_USERNAME_LEN};
use crate::db::AccountStore;
use crate::models::{
    AccountRecord, AccountSummary, AccountView, ValidatedSession, normalize_username,
};
use crate::services::account_service::{AccountError, AccountService, AuthFailure};
use crate::services::clock::Clock;
use crate::services::hasher::SecretHasher;

/// Hashed once and verified against on unknown usernames.
const DUMMY_SECRET: &str = "ethicslab-unknown-account";

pub struct StoreAccountService {
    store: Arc<dyn AccountStore>,
    hasher: Arc<dyn SecretHasher>,
    clock: Arc<dyn Clock>,
    expiring_soon: TimeDelta,
    /// Held across every read-modify-write so concurrent mutations cannot
    /// overwrite each other.
    write_lock: Mutex<()>,
    dummy_hash: OnceCell<String>,
}

impl StoreAccountService {
    #[must_use]
    pub fn new(
        store: Arc<dyn AccountStore>,
        hasher: Arc<dyn SecretHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            hasher,
            clock,
            expiring_soon: TimeDelta::days(EXPIRING_SOON_DAYS),
            write_lock: Mutex::new(()),
            dummy_hash: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_expiring_soon_days(mut self, days: u32) -> Self {
        self.expiring_soon = TimeDelta::days(i64::from(days));
        self
    }

    /// Spends one verification so unknown usernames cost as much as wrong secrets.
    async fn verify_dummy(&self, secret: &str) -> Result<(), AccountError> {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| self.hasher.hash(DUMMY_SECRET))
            .await?;
        self.hasher.verify(secret, dummy).await?;
        Ok(())
    }

    async fn load(&self) -> Result<Vec<AccountRecord>, AccountError> {
        self.store.ensure_initialized().await?;
        Ok(self.store.read_all().await?)
    }

    /// Runs `apply` against a fresh copy of the collection and persists the
    /// result. Nothing is written when `apply` fails.
    async fn mutate<T, F>(&self, apply: F) -> Result<T, AccountError>
    where
        F: FnOnce(&mut Vec<AccountRecord>, DateTime<Utc>) -> Result<T, AccountError> + Send,
        T: Send,
    {
        let _guard = self.write_lock.lock().await;

        let mut records = self.load().await?;
        let output = apply(&mut records, self.clock.now())?;
        self.store.write_all(&records).await?;

        Ok(output)
    }
}

fn validate_username(username: &str) -> Result<(), AccountError> {
    if username.is_empty() {
        return Err(AccountError::validation("Username is required"));
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AccountError::validation(format!(
            "Username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_secret(secret: &str) -> Result<(), AccountError> {
    if secret.is_empty() {
        return Err(AccountError::validation("Password is required"));
    }
    if secret.chars().count() < MIN_SECRET_LEN {
        return Err(AccountError::validation(format!(
            "Password must be at least {MIN_SECRET_LEN} characters"
        )));
    }
    Ok(())
}

fn lifetime_days(days: i64, what: &str) -> Result<TimeDelta, AccountError> {
    if days <= 0 {
        return Err(AccountError::validation(format!(
            "{what} must be at least 1 day"
        )));
    }
    TimeDelta::try_days(days)
        .ok_or_else(|| AccountError::validation(format!("{what} of {days} days is out of range")))
}

fn add_lifetime(base: DateTime<Utc>, lifetime: TimeDelta) -> Result<DateTime<Utc>, AccountError> {
    base.checked_add_signed(lifetime)
        .ok_or_else(|| AccountError::validation("Expiration date is out of range"))
}

fn find<'a>(records: &'a [AccountRecord], username: &str) -> Option<&'a AccountRecord> {
    records.iter().find(|r| r.matches(username))
}

#[async_trait]
impl AccountService for StoreAccountService {
    async fn create(
        &self,
        username: &str,
        secret: &str,
        expiration_days: i64,
        created_by: &str,
    ) -> Result<AccountSummary, AccountError> {
        let username = normalize_username(username);
        validate_username(&username)?;
        validate_secret(secret)?;
        let lifetime = lifetime_days(expiration_days, "Expiration")?;

        // Cheap rejection before paying for the hash; re-checked under the lock.
        if find(&self.load().await?, &username).is_some() {
            return Err(AccountError::Duplicate(username));
        }

        let credential_hash = self.hasher.hash(secret).await?;
        let created_by = created_by.to_string();

        let record = self
            .mutate(move |records, now| {
                if find(records, &username).is_some() {
                    return Err(AccountError::Duplicate(username));
                }

                let record = AccountRecord {
                    id: Uuid::new_v4().to_string(),
                    username,
                    credential_hash,
                    created_at: now,
                    expires_at: add_lifetime(now, lifetime)?,
                    created_by,
                    active: true,
                };
                records.push(record.clone());
                Ok(record)
            })
            .await?;

        info!(
            username = %record.username,
            expires_at = %record.expires_at,
            created_by = %record.created_by,
            "Account created"
        );

        Ok(AccountSummary::from(&record))
    }

    async fn validate(
        &self,
        username: &str,
        secret: &str,
    ) -> Result<ValidatedSession, AccountError> {
        let username = normalize_username(username);
        let records = self.load().await?;

        let Some(record) = find(&records, &username) else {
            self.verify_dummy(secret).await?;
            return Err(AuthFailure::InvalidCredentials.into());
        };

        if !record.active {
            return Err(AuthFailure::Deactivated.into());
        }

        if !self.hasher.verify(secret, &record.credential_hash).await? {
            return Err(AuthFailure::InvalidCredentials.into());
        }

        let now = self.clock.now();
        if record.is_expired_at(now) {
            return Err(AuthFailure::Expired.into());
        }

        Ok(ValidatedSession {
            username: record.username.clone(),
            expires_at: record.expires_at,
            remaining_ms: (record.expires_at - now).num_milliseconds(),
        })
    }

    async fn extend(&self, username: &str, days: i64) -> Result<DateTime<Utc>, AccountError> {
        let lifetime = lifetime_days(days, "Extension")?;
        let username = normalize_username(username);

        let expires_at = self
            .mutate(|records, now| {
                let record = records
                    .iter_mut()
                    .find(|r| r.matches(&username))
                    .ok_or_else(|| AccountError::NotFound(username.clone()))?;

                // Restart from now for already-expired accounts.
                let expires_at = add_lifetime(record.expires_at.max(now), lifetime)?;
                record.expires_at = expires_at;
                record.active = true;
                Ok(expires_at)
            })
            .await?;

        info!(username = %username, days, expires_at = %expires_at, "Account extended");
        Ok(expires_at)
    }

    async fn deactivate(&self, username: &str) -> Result<(), AccountError> {
        let username = normalize_username(username);

        self.mutate(|records, _| {
            let record = records
                .iter_mut()
                .find(|r| r.matches(&username))
                .ok_or_else(|| AccountError::NotFound(username.clone()))?;
            record.active = false;
            Ok(())
        })
        .await?;

        info!(username = %username, "Account deactivated");
        Ok(())
    }

    async fn delete(&self, username: &str) -> Result<(), AccountError> {
        let username = normalize_username(username);

        self.mutate(|records, _| {
            let index = records
                .iter()
                .position(|r| r.matches(&username))
                .ok_or_else(|| AccountError::NotFound(username.clone()))?;
            records.remove(index);
            Ok(())
        })
        .await?;

        info!(username = %username, "Account deleted");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<AccountView>, AccountError> {
        let records = self.load().await?;
        let now = self.clock.now();

        Ok(records
            .iter()
            .map(|r| AccountView::new(r, now, self.expiring_soon))
            .collect())
    }

    async fn get(&self, username: &str) -> Result<Option<AccountView>, AccountError> {
        let username = normalize_username(username);
        let records = self.load().await?;
        let now = self.clock.now();

        Ok(find(&records, &username).map(|r| AccountView::new(r, now, self.expiring_soon)))
    }
}
