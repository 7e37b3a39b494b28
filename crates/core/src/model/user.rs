use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::history::ProgressHistory;
use crate::model::ids::UserId;
use crate::model::progress::ProgressEntry;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

pub const USERNAME_MAX_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("username cannot be empty")]
    EmptyUsername,

    #[error("username is too long: {len} chars")]
    UsernameTooLong { len: usize },

    #[error("username may only contain letters, digits, '_', '-' and '.'")]
    InvalidUsernameChar,
}

//
// ─── USERNAME ──────────────────────────────────────────────────────────────────
//

/// Validated unique login name.
///
/// Surrounding whitespace is trimmed before validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Parse and validate a username.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if the name is empty, longer than
    /// `USERNAME_MAX_LEN` chars, or contains characters outside
    /// `[A-Za-z0-9_.-]`.
    pub fn parse(s: impl Into<String>) -> Result<Self, UserError> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(UserError::EmptyUsername);
        }
        let len = trimmed.chars().count();
        if len > USERNAME_MAX_LEN {
            return Err(UserError::UsernameTooLong { len });
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(UserError::InvalidUsernameChar);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── PASSWORD HASH ─────────────────────────────────────────────────────────────
//

/// Opaque one-way hash of a user secret, as produced by the hashing capability.
///
/// The raw value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PasswordHash(..)")
    }
}

//
// ─── USER ──────────────────────────────────────────────────────────────────────
//

/// One registered identity and the progress history it owns.
///
/// Created at signup with an empty history. The only mutations are replacing
/// the credential hash and appending progress entries; there is no deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    username: Username,
    password_hash: PasswordHash,
    created_at: DateTime<Utc>,
    history: ProgressHistory,
}

impl User {
    /// Creates a new user with an empty progress history.
    #[must_use]
    pub fn new(
        id: UserId,
        username: Username,
        password_hash: PasswordHash,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            password_hash,
            created_at,
            history: ProgressHistory::new(),
        }
    }

    /// Rehydrate a user from persisted storage.
    #[must_use]
    pub fn from_persisted(
        id: UserId,
        username: Username,
        password_hash: PasswordHash,
        created_at: DateTime<Utc>,
        history: ProgressHistory,
    ) -> Self {
        Self {
            id,
            username,
            password_hash,
            created_at,
            history,
        }
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> &Username {
        &self.username
    }

    #[must_use]
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn history(&self) -> &ProgressHistory {
        &self.history
    }

    /// Replace the stored credential hash (login-recovery path).
    pub fn set_password_hash(&mut self, hash: PasswordHash) {
        self.password_hash = hash;
    }

    /// Append a progress entry, trimming the history to its cap.
    ///
    /// Returns the number of evicted entries (0 or 1 in practice).
    pub fn record_progress(&mut self, entry: ProgressEntry) -> usize {
        self.history.push(entry)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
