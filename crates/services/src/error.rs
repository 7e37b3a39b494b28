//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use trainer_core::model::{ProgressValidationError, UserError};

/// Stable machine-checkable kind attached to every caller-visible failure.
///
/// `Internal` covers durable-store and capability failures; its human
/// message never carries engine detail (the detail stays on the error
/// source chain and in the logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    Expired,
    InvalidCredentials,
    NotFound,
    Conflict,
    Internal,
}

/// Errors emitted by the credential hashing capability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CredentialError {
    #[error("credential hashing is unavailable")]
    Unavailable,

    #[error("stored credential hash is malformed")]
    MalformedHash,
}

/// Errors emitted by token verification and subject checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    #[error("missing session token")]
    MissingToken,

    #[error("invalid session token")]
    InvalidToken,

    #[error("session token expired")]
    Expired,

    #[error("token subject does not match the requested user")]
    Forbidden,
}

impl AuthError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Expired => ErrorKind::Expired,
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::Forbidden => {
                ErrorKind::Unauthorized
            }
        }
    }
}

/// Errors emitted while building a token service from the environment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TokenConfigError {
    #[error("TRAINER_TOKEN_SECRET is not set")]
    MissingSecret,

    #[error("TRAINER_TOKEN_TTL_SECS is not a valid number of seconds")]
    InvalidTtl,
}

/// Errors emitted by `AccountService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AccountError {
    #[error("username is already registered")]
    DuplicateUsername,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("user not found")]
    UserNotFound,

    #[error("password must be at least 8 characters")]
    WeakPassword,

    #[error(transparent)]
    Validation(#[from] UserError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("internal storage failure")]
    Storage(#[from] StorageError),
}

impl AccountError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::DuplicateUsername => ErrorKind::Conflict,
            AccountError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AccountError::UserNotFound => ErrorKind::NotFound,
            AccountError::WeakPassword | AccountError::Validation(_) => ErrorKind::Validation,
            AccountError::Auth(e) => e.kind(),
            AccountError::Credential(_) | AccountError::Storage(_) => ErrorKind::Internal,
        }
    }
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Validation(#[from] ProgressValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("internal storage failure")]
    Storage(#[from] StorageError),
}

impl ProgressServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProgressServiceError::UserNotFound => ErrorKind::NotFound,
            ProgressServiceError::Validation(_) => ErrorKind::Validation,
            ProgressServiceError::Auth(e) => e.kind(),
            ProgressServiceError::Storage(_) => ErrorKind::Internal,
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),

    #[error(transparent)]
    TokenConfig(#[from] TokenConfigError),
}
