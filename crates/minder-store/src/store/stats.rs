//! Per-user streak aggregates.

use super::Store;
use minder_core::error::MinderError;

/// Streak state as the aggregator reads and writes it.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct UserStatsRow {
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_success_date: Option<String>,
    pub last_summary_date: Option<String>,
}

impl Store {
    /// Current stats for a user; default zero row when none exists yet.
    pub async fn get_stats(&self, chat_id: &str) -> Result<UserStatsRow, MinderError> {
        let row: Option<UserStatsRow> = sqlx::query_as(
            "SELECT current_streak, longest_streak, last_success_date, last_summary_date \
             FROM user_stats WHERE chat_id = ?",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MinderError::Store(format!("get stats failed: {e}")))?;
        Ok(row.unwrap_or_default())
    }

    /// Persist the whole stats row in one keyed upsert.
    ///
    /// `last_summary_date` is written together with the streak fields, so a
    /// crash between computing and persisting cannot leave a state a retry
    /// would double-count.
    pub async fn upsert_stats(
        &self,
        chat_id: &str,
        current_streak: i64,
        longest_streak: i64,
        last_success_date: Option<&str>,
        last_summary_date: &str,
    ) -> Result<(), MinderError> {
        sqlx::query(
            "INSERT INTO user_stats \
                 (chat_id, current_streak, longest_streak, last_success_date, last_summary_date) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(chat_id) DO UPDATE SET \
                 current_streak = excluded.current_streak, \
                 longest_streak = excluded.longest_streak, \
                 last_success_date = excluded.last_success_date, \
                 last_summary_date = excluded.last_summary_date",
        )
        .bind(chat_id)
        .bind(current_streak)
        .bind(longest_streak)
        .bind(last_success_date)
        .bind(last_summary_date)
        .execute(&self.pool)
        .await
        .map_err(|e| MinderError::Store(format!("upsert stats failed: {e}")))?;
        Ok(())
    }
}
