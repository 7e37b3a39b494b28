use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;

use trainer_core::model::UserId;

use crate::error::{AuthError, TokenConfigError};

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3_600;

const SECRET_ENV: &str = "TRAINER_TOKEN_SECRET";
const TTL_ENV: &str = "TRAINER_TOKEN_TTL_SECS";

//
// ─── TOKEN ─────────────────────────────────────────────────────────────────────
//

/// A signed, expiring session token in `<claims>.<signature>` form.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken(..)")
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: UserId,
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Issues and verifies HMAC-SHA256 signed session tokens.
///
/// The claims payload is base64url-encoded JSON; the signature covers the
/// encoded payload. Verification is offline, no store lookup involved.
#[derive(Clone)]
pub struct SessionTokenService {
    secret: Vec<u8>,
    ttl: Duration,
}

impl SessionTokenService {
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// Token service with the default 1-hour validity window.
    #[must_use]
    pub fn with_default_ttl(secret: impl Into<Vec<u8>>) -> Self {
        Self::new(secret, Duration::seconds(DEFAULT_TOKEN_TTL_SECS))
    }

    /// Build from `TRAINER_TOKEN_SECRET` and optional `TRAINER_TOKEN_TTL_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `TokenConfigError::MissingSecret` if the secret variable is
    /// unset or empty, `InvalidTtl` if the TTL variable does not parse to a
    /// positive number of seconds.
    pub fn from_env() -> Result<Self, TokenConfigError> {
        let secret = std::env::var(SECRET_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(TokenConfigError::MissingSecret)?;

        let ttl = match std::env::var(TTL_ENV) {
            Ok(raw) => {
                let secs: i64 = raw.parse().map_err(|_| TokenConfigError::InvalidTtl)?;
                if secs <= 0 {
                    return Err(TokenConfigError::InvalidTtl);
                }
                Duration::seconds(secs)
            }
            Err(_) => Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
        };

        Ok(Self::new(secret.into_bytes(), ttl))
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn sign(&self, payload: &str) -> String {
        // HMAC accepts keys of any length.
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC key of any length is accepted");
        mac.update(payload.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// Issue a token for the given subject, valid for the service TTL.
    #[must_use]
    pub fn issue(&self, user_id: UserId, username: &str, now: DateTime<Utc>) -> SessionToken {
        let claims = TokenClaims {
            user_id,
            username: username.to_owned(),
            issued_at: now,
            expires_at: now + self.ttl,
        };
        // A flat struct of strings and timestamps always serializes.
        let json = serde_json::to_vec(&claims).expect("token claims serialize to JSON");
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = self.sign(&payload);
        SessionToken(format!("{payload}.{signature}"))
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for malformed or tampered tokens and
    /// `AuthError::Expired` once the validity window has passed.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::InvalidToken)?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::InvalidToken)?;
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC key of any length is accepted");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::InvalidToken)?;
        let claims: TokenClaims =
            serde_json::from_slice(&json).map_err(|_| AuthError::InvalidToken)?;

        if claims.expires_at <= now {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
