#![forbid(unsafe_code)]

pub mod account_service;
pub mod app_services;
pub mod credentials;
pub mod error;
pub mod progress_service;
pub mod token;

pub use trainer_core::Clock;

pub use account_service::{AccountService, MIN_PASSWORD_LEN, SessionGrant};
pub use app_services::AppServices;
pub use credentials::{CredentialHasher, SaltedSha256Hasher};
pub use error::{
    AccountError, AppServicesError, AuthError, CredentialError, ErrorKind, ProgressServiceError,
    TokenConfigError,
};
pub use progress_service::{ProgressService, ProgressUpdate};
pub use token::{DEFAULT_TOKEN_TTL_SECS, SessionToken, SessionTokenService, TokenClaims};
