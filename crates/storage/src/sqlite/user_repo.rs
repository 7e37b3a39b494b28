use async_trait::async_trait;
use sqlx::sqlite::SqliteConnection;

use super::SqliteRepository;
use super::mapping::{map_entry_row, map_user_row};
use crate::repository::{ProgressEntryRecord, StorageError, UserRecord, UserRepository};
use trainer_core::model::{PasswordHash, ProgressHistory, UserId};

fn conn_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db)
            if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            StorageError::Conflict
        }
        _ => StorageError::Connection(e.to_string()),
    }
}

fn position_i64(position: usize) -> Result<i64, StorageError> {
    i64::try_from(position)
        .map_err(|_| StorageError::Serialization(format!("position overflow: {position}")))
}

async fn insert_entries(
    conn: &mut SqliteConnection,
    user_id: UserId,
    entries: &[ProgressEntryRecord],
) -> Result<(), StorageError> {
    for (position, entry) in entries.iter().enumerate() {
        sqlx::query(
            r"
                INSERT INTO progress_entries (
                    user_id, position, completed_exercises, accuracy,
                    score, level, comments, recorded_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(user_id.value().to_string())
        .bind(position_i64(position)?)
        .bind(i64::from(entry.completed_exercises))
        .bind(entry.accuracy)
        .bind(entry.score)
        .bind(i64::from(entry.level))
        .bind(entry.comments.as_str())
        .bind(entry.recorded_at)
        .execute(&mut *conn)
        .await
        .map_err(conn_err)?;
    }
    Ok(())
}

impl SqliteRepository {
    async fn load_entries(&self, user_id: UserId) -> Result<Vec<ProgressEntryRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT completed_exercises, accuracy, score, level, comments, recorded_at
                FROM progress_entries
                WHERE user_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(user_id.value().to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(map_entry_row(&row)?);
        }
        Ok(entries)
    }

    async fn load_user(
        &self,
        row: Option<sqlx::sqlite::SqliteRow>,
    ) -> Result<Option<UserRecord>, StorageError> {
        let Some(row) = row else {
            return Ok(None);
        };
        let mut record = map_user_row(&row)?;
        record.entries = self.load_entries(record.id).await?;
        Ok(Some(record))
    }
}

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_new_user(&self, record: &UserRecord) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn_err)?;

        sqlx::query(
            r"
                INSERT INTO users (id, username, password_hash, created_at)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(record.id.value().to_string())
        .bind(record.username.as_str())
        .bind(record.password_hash.as_str())
        .bind(record.created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn_err)?;

        insert_entries(&mut *tx, record.id, &record.entries).await?;

        tx.commit().await.map_err(conn_err)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, username, password_hash, created_at
                FROM users
                WHERE id = ?1
            ",
        )
        .bind(id.value().to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn_err)?;

        self.load_user(row).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, username, password_hash, created_at
                FROM users
                WHERE username = ?1
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn_err)?;

        self.load_user(row).await
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        hash: &PasswordHash,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE users SET password_hash = ?1 WHERE id = ?2")
            .bind(hash.as_str())
            .bind(id.value().to_string())
            .execute(&self.pool)
            .await
            .map_err(conn_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn replace_history(
        &self,
        id: UserId,
        history: &ProgressHistory,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn_err)?;

        let exists = sqlx::query("SELECT 1 FROM users WHERE id = ?1")
            .bind(id.value().to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn_err)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        sqlx::query("DELETE FROM progress_entries WHERE user_id = ?1")
            .bind(id.value().to_string())
            .execute(&mut *tx)
            .await
            .map_err(conn_err)?;

        let entries: Vec<ProgressEntryRecord> =
            history.iter().map(ProgressEntryRecord::from_entry).collect();
        insert_entries(&mut *tx, id, &entries).await?;

        tx.commit().await.map_err(conn_err)
    }
}
