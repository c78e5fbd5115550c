use anyhow::Context;
use std::sync::Arc;

use crate::config::Config;
use crate::db::{AccountStore, JsonFileStore};
use crate::services::{
    AccountService, Argon2Hasher, Clock, SecretHasher, StoreAccountService, SystemClock,
};

/// Process-wide dependencies shared by the web layer and the CLI.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub accounts: Arc<dyn AccountService>,

    pub clock: Arc<dyn Clock>,
}

impl SharedState {
    /// Wires the JSON document store, Argon2 hasher and system clock.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn AccountStore> =
            Arc::new(JsonFileStore::new(&config.general.accounts_path));
        let hasher: Arc<dyn SecretHasher> = Arc::new(
            Argon2Hasher::from_config(&config.security).context("Invalid Argon2 configuration")?,
        );

        Ok(Self::with_parts(config, store, hasher, Arc::new(SystemClock)))
    }

    /// Lets tests swap in an in-memory store, cheap hasher or manual clock.
    #[must_use]
    pub fn with_parts(
        config: Config,
        store: Arc<dyn AccountStore>,
        hasher: Arc<dyn SecretHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let accounts = StoreAccountService::new(store, hasher, clock.clone())
            .with_expiring_soon_days(config.accounts.expiring_soon_days);

        Self {
            config: Arc::new(config),
            accounts: Arc::new(accounts),
            clock,
        }
    }
}
