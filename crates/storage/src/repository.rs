use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use trainer_core::model::{
    PasswordHash, ProgressEntry, ProgressHistory, User, UserId, Username,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for one progress entry inside a user record.
///
/// Entries carry no identity of their own; their order within the owning
/// user record is the history order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEntryRecord {
    pub completed_exercises: u32,
    pub accuracy: f64,
    pub score: f64,
    pub level: u32,
    pub comments: String,
    pub recorded_at: DateTime<Utc>,
}

impl ProgressEntryRecord {
    #[must_use]
    pub fn from_entry(entry: &ProgressEntry) -> Self {
        Self {
            completed_exercises: entry.completed_exercises(),
            accuracy: entry.accuracy(),
            score: entry.score(),
            level: entry.level(),
            comments: entry.comments().to_owned(),
            recorded_at: entry.recorded_at(),
        }
    }

    /// Convert the record back into a domain entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored values no longer
    /// pass domain validation.
    pub fn into_entry(self) -> Result<ProgressEntry, StorageError> {
        ProgressEntry::from_persisted(
            self.completed_exercises,
            self.accuracy,
            self.score,
            self.level,
            self.comments,
            self.recorded_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

/// Persisted shape for a user, including the embedded progress list.
///
/// This mirrors the domain `User` so repositories can serialize/deserialize
/// without leaking storage concerns into the domain layer.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    /// Oldest first, already capped by the domain history.
    pub entries: Vec<ProgressEntryRecord>,
}

impl UserRecord {
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id(),
            username: user.username().as_str().to_owned(),
            password_hash: user.password_hash().as_str().to_owned(),
            created_at: user.created_at(),
            entries: user
                .history()
                .iter()
                .map(ProgressEntryRecord::from_entry)
                .collect(),
        }
    }

    /// Convert the record back into a domain `User`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored username or any
    /// entry fails domain validation.
    pub fn into_user(self) -> Result<User, StorageError> {
        let username = Username::parse(self.username)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut entries = Vec::with_capacity(self.entries.len());
        for record in self.entries {
            entries.push(record.into_entry()?);
        }

        Ok(User::from_persisted(
            self.id,
            username,
            PasswordHash::new(self.password_hash),
            self.created_at,
            ProgressHistory::from_persisted(entries),
        ))
    }
}

/// Repository contract for user records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a freshly registered user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the username is already taken,
    /// or other storage errors.
    async fn insert_new_user(&self, record: &UserRecord) -> Result<(), StorageError>;

    /// Fetch a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup itself fails; a missing user is
    /// `Ok(None)`.
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StorageError>;

    /// Fetch a user by unique username.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup itself fails; a missing user is
    /// `Ok(None)`.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError>;

    /// Replace the stored credential hash.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist.
    async fn update_password_hash(
        &self,
        id: UserId,
        hash: &PasswordHash,
    ) -> Result<(), StorageError>;

    /// Atomically swap the user's embedded progress list.
    ///
    /// The whole swap is one write: concurrent readers observe either the
    /// previous or the new history, never a partial one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist.
    async fn replace_history(
        &self,
        id: UserId,
        history: &ProgressHistory,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    users: Arc<Mutex<HashMap<UserId, UserRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_new_user(&self, record: &UserRecord) -> Result<(), StorageError> {
        let mut guard = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.values().any(|u| u.username == record.username) {
            return Err(StorageError::Conflict);
        }
        guard.insert(record.id, record.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StorageError> {
        let guard = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        let guard = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.values().find(|u| u.username == username).cloned())
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        hash: &PasswordHash,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let record = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        record.password_hash = hash.as_str().to_owned();
        Ok(())
    }

    async fn replace_history(
        &self,
        id: UserId,
        history: &ProgressHistory,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let record = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        record.entries = history.iter().map(ProgressEntryRecord::from_entry).collect();
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let users: Arc<dyn UserRepository> = Arc::new(repo);
        Self { users }
    }
}
