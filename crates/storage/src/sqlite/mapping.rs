use sqlx::Row;
use uuid::Uuid;

use crate::repository::{ProgressEntryRecord, StorageError, UserRecord};
use trainer_core::model::UserId;

pub(super) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(super) fn user_id_from_str(raw: &str) -> Result<UserId, StorageError> {
    Uuid::parse_str(raw)
        .map(UserId::new)
        .map_err(|_| StorageError::Serialization(format!("invalid user id: {raw}")))
}

pub(super) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

/// Maps a `users` row; the entry list is filled in by the caller.
pub(super) fn map_user_row(row: &sqlx::sqlite::SqliteRow) -> Result<UserRecord, StorageError> {
    let id = user_id_from_str(&row.try_get::<String, _>("id").map_err(ser)?)?;
    Ok(UserRecord {
        id,
        username: row.try_get("username").map_err(ser)?,
        password_hash: row.try_get("password_hash").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
        entries: Vec::new(),
    })
}

pub(super) fn map_entry_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ProgressEntryRecord, StorageError> {
    Ok(ProgressEntryRecord {
        completed_exercises: u32_from_i64(
            "completed_exercises",
            row.try_get::<i64, _>("completed_exercises").map_err(ser)?,
        )?,
        accuracy: row.try_get("accuracy").map_err(ser)?,
        score: row.try_get("score").map_err(ser)?,
        level: u32_from_i64("level", row.try_get::<i64, _>("level").map_err(ser)?)?,
        comments: row.try_get("comments").map_err(ser)?,
        recorded_at: row.try_get("recorded_at").map_err(ser)?,
    })
}
