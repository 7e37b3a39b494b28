use std::sync::Arc;

use storage::repository::Storage;
use trainer_core::time::Clock;

use crate::account_service::AccountService;
use crate::credentials::{CredentialHasher, SaltedSha256Hasher};
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::token::SessionTokenService;

/// Assembles the account and progress services over a storage backend.
#[derive(Clone)]
pub struct AppServices {
    accounts: Arc<AccountService>,
    progress: Arc<ProgressService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        tokens: SessionTokenService,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::assemble(storage, clock, tokens))
    }

    /// Build services over the in-memory repository (tests, prototyping).
    #[must_use]
    pub fn new_in_memory(clock: Clock, tokens: SessionTokenService) -> Self {
        Self::assemble(Storage::in_memory(), clock, tokens)
    }

    fn assemble(storage: Storage, clock: Clock, tokens: SessionTokenService) -> Self {
        let hasher: Arc<dyn CredentialHasher> = Arc::new(SaltedSha256Hasher);
        let accounts = Arc::new(AccountService::new(
            Arc::clone(&storage.users),
            hasher,
            tokens,
            clock,
        ));
        let progress = Arc::new(ProgressService::new(Arc::clone(&storage.users), clock));
        Self { accounts, progress }
    }

    #[must_use]
    pub fn accounts(&self) -> Arc<AccountService> {
        Arc::clone(&self.accounts)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }
}
