use std::sync::Arc;

use tracing::{info, warn};

use storage::repository::{StorageError, UserRecord, UserRepository};
use trainer_core::model::{PasswordHash, User, UserId, Username};
use trainer_core::time::Clock;

use crate::credentials::CredentialHasher;
use crate::error::{AccountError, AuthError};
use crate::token::{SessionToken, SessionTokenService, TokenClaims};

pub const MIN_PASSWORD_LEN: usize = 8;

//
// ─── SESSION GRANT ─────────────────────────────────────────────────────────────
//

/// Outcome of a successful login: the issued token and its subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    pub token: SessionToken,
    pub user_id: UserId,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Identity and session flows over an injected user repository, credential
/// hasher and token service.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: SessionTokenService,
    clock: Clock,
}

fn store_failure(err: StorageError) -> AccountError {
    warn!(error = %err, "durable store failure");
    AccountError::Storage(err)
}

fn check_password(password: &str) -> Result<(), AccountError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::WeakPassword);
    }
    Ok(())
}

impl AccountService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: SessionTokenService,
        clock: Clock,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            clock,
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Register a new identity with an empty progress history.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::DuplicateUsername` if the name is taken,
    /// `Validation`/`WeakPassword` for rejected input, `Credential` if
    /// hashing is unavailable, `Storage` on store failure.
    pub async fn sign_up(&self, username: &str, password: &str) -> Result<UserId, AccountError> {
        let username = Username::parse(username)?;
        check_password(password)?;

        let hash = self.hasher.hash(password).await?;
        let user = User::new(UserId::new_random(), username, hash, self.clock.now());

        match self.users.insert_new_user(&UserRecord::from_user(&user)).await {
            Ok(()) => {
                info!(user_id = %user.id(), "registered new user");
                Ok(user.id())
            }
            Err(StorageError::Conflict) => Err(AccountError::DuplicateUsername),
            Err(err) => Err(store_failure(err)),
        }
    }

    /// Authenticate a username/password pair and issue a session token.
    ///
    /// Unknown usernames and wrong passwords both surface
    /// `InvalidCredentials`, so the response carries no user-existence
    /// oracle.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidCredentials` on mismatch, `Credential`
    /// if hashing is unavailable, `Storage` on store failure.
    pub async fn log_in(&self, username: &str, password: &str) -> Result<SessionGrant, AccountError> {
        let record = self
            .users
            .find_by_username(username.trim())
            .await
            .map_err(store_failure)?
            .ok_or(AccountError::InvalidCredentials)?;

        let stored = PasswordHash::new(record.password_hash.clone());
        if !self.hasher.verify(password, &stored).await? {
            return Err(AccountError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(record.id, &record.username, self.clock.now());
        Ok(SessionGrant {
            token,
            user_id: record.id,
        })
    }

    /// Replace a user's stored credential hash.
    ///
    /// Knowing the username is the only identity proof this recovery flow
    /// demands — a known weakness of the modeled flow, kept as such rather
    /// than silently hardened.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::UserNotFound` for unknown usernames,
    /// `WeakPassword` for rejected input, `Storage` on store failure.
    pub async fn reset_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        check_password(new_password)?;

        let record = self
            .users
            .find_by_username(username.trim())
            .await
            .map_err(store_failure)?
            .ok_or(AccountError::UserNotFound)?;

        let hash = self.hasher.hash(new_password).await?;
        self.users
            .update_password_hash(record.id, &hash)
            .await
            .map_err(|err| match err {
                StorageError::NotFound => AccountError::UserNotFound,
                other => store_failure(other),
            })
    }

    /// Resolve a bearer token into its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingToken` when no token was presented,
    /// `InvalidToken` for malformed or tampered tokens, `Expired` past the
    /// validity window.
    pub fn authenticate(&self, token: Option<&str>) -> Result<TokenClaims, AccountError> {
        let token = token.ok_or(AuthError::MissingToken)?;
        Ok(self.tokens.verify(token, self.clock.now())?)
    }
}
