//! User rows: creation on first contact, offset updates, iteration.

use super::Store;
use minder_core::{error::MinderError, localtime};

/// A user as the sweeps see it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub chat_id: String,
    pub utc_offset_min: i32,
}

impl Store {
    /// Create the user row if it does not exist yet. Idempotent.
    pub async fn ensure_user(&self, chat_id: &str) -> Result<(), MinderError> {
        sqlx::query("INSERT OR IGNORE INTO users (chat_id) VALUES (?)")
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .map_err(|e| MinderError::Store(format!("ensure user failed: {e}")))?;
        Ok(())
    }

    /// Set the user's UTC offset. Rejects offsets outside the supported range;
    /// callers validate first and turn the rejection into a plain user-facing
    /// message.
    pub async fn set_utc_offset(&self, chat_id: &str, offset_min: i32) -> Result<(), MinderError> {
        if !localtime::offset_in_range(offset_min) {
            return Err(MinderError::Store(format!(
                "utc offset {offset_min} outside [{}, {}]",
                localtime::MIN_UTC_OFFSET_MIN,
                localtime::MAX_UTC_OFFSET_MIN
            )));
        }
        sqlx::query("UPDATE users SET utc_offset_min = ? WHERE chat_id = ?")
            .bind(offset_min)
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .map_err(|e| MinderError::Store(format!("set offset failed: {e}")))?;
        Ok(())
    }

    /// Fetch one user.
    pub async fn get_user(&self, chat_id: &str) -> Result<Option<UserRow>, MinderError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT chat_id, utc_offset_min FROM users WHERE chat_id = ?",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MinderError::Store(format!("get user failed: {e}")))
    }

    /// All users, for sweep iteration.
    pub async fn all_users(&self) -> Result<Vec<UserRow>, MinderError> {
        sqlx::query_as::<_, UserRow>("SELECT chat_id, utc_offset_min FROM users ORDER BY chat_id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MinderError::Store(format!("list users failed: {e}")))
    }

    /// Number of known users (health endpoint).
    pub async fn user_count(&self) -> Result<i64, MinderError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MinderError::Store(format!("count users failed: {e}")))?;
        Ok(count)
    }
}
