//! Task lifecycle: creation, claim-and-return reminder selection, the
//! terminal praise/scold transition, the response side-channel, and daily
//! rollover.
//!
//! Claims are single conditional statements. A sweep only acts on rows the
//! statement actually changed, so two overlapping sweeps can never both own
//! the same task.

use super::Store;
use minder_core::error::MinderError;
use uuid::Uuid;

/// A task row as read by the sweeps and the list operation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskRow {
    pub id: String,
    pub chat_id: String,
    pub local_date: String,
    pub time_minutes: i64,
    pub name: String,
    pub reminder_sent: bool,
    pub user_response: Option<String>,
    pub praised: bool,
    pub scolded: bool,
}

const TASK_COLUMNS: &str = "id, chat_id, local_date, time_minutes, name, \
     reminder_sent, user_response, praised, scolded";

impl Store {
    /// Create a task for a user's local date at minutes-since-midnight.
    pub async fn create_task(
        &self,
        chat_id: &str,
        local_date: &str,
        time_minutes: u32,
        name: &str,
    ) -> Result<String, MinderError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO tasks (id, chat_id, local_date, time_minutes, name) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(chat_id)
        .bind(local_date)
        .bind(time_minutes as i64)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(|e| MinderError::Store(format!("create task failed: {e}")))?;
        Ok(id)
    }

    /// Claim due-but-unreminded tasks inside the look-ahead window.
    ///
    /// Marks `reminder_sent` and returns only the rows this statement
    /// actually flipped — the claim-and-return pattern. A task claimed by an
    /// overlapping sweep is absent from the result set.
    pub async fn claim_due_reminders(
        &self,
        chat_id: &str,
        local_date: &str,
        from_minute: u32,
        to_minute: u32,
    ) -> Result<Vec<(String, String, i64)>, MinderError> {
        // Returns: (id, name, time_minutes)
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            "UPDATE tasks SET reminder_sent = 1 \
             WHERE chat_id = ? AND local_date = ? AND reminder_sent = 0 \
               AND time_minutes BETWEEN ? AND ? \
             RETURNING id, name, time_minutes",
        )
        .bind(chat_id)
        .bind(local_date)
        .bind(from_minute as i64)
        .bind(to_minute as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MinderError::Store(format!("claim reminders failed: {e}")))?;
        Ok(rows)
    }

    /// Reminded, non-terminal tasks whose scheduled time sits inside the
    /// look-back window. Read-only: the exclusive claim happens in
    /// `claim_terminal` per task.
    pub async fn feedback_candidates(
        &self,
        chat_id: &str,
        local_date: &str,
        from_minute: u32,
        to_minute: u32,
    ) -> Result<Vec<TaskRow>, MinderError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE chat_id = ? AND local_date = ? \
               AND reminder_sent = 1 AND praised = 0 AND scolded = 0 \
               AND time_minutes BETWEEN ? AND ? \
             ORDER BY time_minutes ASC"
        );
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(chat_id)
            .bind(local_date)
            .bind(from_minute as i64)
            .bind(to_minute as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MinderError::Store(format!("feedback candidates failed: {e}")))
    }

    /// Claim the terminal transition for a task.
    ///
    /// Sets `praised` or `scolded` only while both flags are still clear;
    /// returns whether this caller won the claim. Praised and scolded are
    /// mutually exclusive by construction, and a terminal task never matches
    /// again until rollover.
    pub async fn claim_terminal(&self, task_id: &str, praised: bool) -> Result<bool, MinderError> {
        let column = if praised { "praised" } else { "scolded" };
        let sql = format!(
            "UPDATE tasks SET {column} = 1 \
             WHERE id = ? AND praised = 0 AND scolded = 0 AND reminder_sent = 1"
        );
        let result = sqlx::query(&sql)
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(|e| MinderError::Store(format!("terminal claim failed: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the user's "doing …" reply against the latest reminded,
    /// non-terminal, not-yet-responded task of the day.
    ///
    /// At most one response per task per day (`user_response IS NULL` guard).
    /// Returns the matched task's name, or `None` when nothing is pending.
    pub async fn record_response(
        &self,
        chat_id: &str,
        local_date: &str,
        response: &str,
    ) -> Result<Option<String>, MinderError> {
        let row: Option<(String,)> = sqlx::query_as(
            "UPDATE tasks SET user_response = ?, responded_at = datetime('now') \
             WHERE id = (SELECT id FROM tasks \
                         WHERE chat_id = ? AND local_date = ? \
                           AND reminder_sent = 1 AND praised = 0 AND scolded = 0 \
                           AND user_response IS NULL \
                         ORDER BY time_minutes DESC LIMIT 1) \
             RETURNING name",
        )
        .bind(response)
        .bind(chat_id)
        .bind(local_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MinderError::Store(format!("record response failed: {e}")))?;
        Ok(row.map(|(name,)| name))
    }

    /// All tasks for a user's local date, schedule order.
    pub async fn tasks_for_date(
        &self,
        chat_id: &str,
        local_date: &str,
    ) -> Result<Vec<TaskRow>, MinderError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE chat_id = ? AND local_date = ? ORDER BY time_minutes ASC"
        );
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(chat_id)
            .bind(local_date)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MinderError::Store(format!("list tasks failed: {e}")))
    }

    /// (planned, completed) counts for a user's local date.
    pub async fn day_counts(
        &self,
        chat_id: &str,
        local_date: &str,
    ) -> Result<(i64, i64), MinderError> {
        let (planned, completed): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(praised), 0) FROM tasks \
             WHERE chat_id = ? AND local_date = ?",
        )
        .bind(chat_id)
        .bind(local_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| MinderError::Store(format!("day counts failed: {e}")))?;
        Ok((planned, completed))
    }

    /// Archive-in-place: reset all lifecycle fields on tasks dated strictly
    /// before the user's current local date. Idempotent — already-reset rows
    /// do not match the predicate. Returns the number of rows reset.
    pub async fn rollover_before(
        &self,
        chat_id: &str,
        local_date: &str,
    ) -> Result<u64, MinderError> {
        let result = sqlx::query(
            "UPDATE tasks SET reminder_sent = 0, praised = 0, scolded = 0, \
                 user_response = NULL, responded_at = NULL \
             WHERE chat_id = ? AND local_date < ? \
               AND (reminder_sent = 1 OR praised = 1 OR scolded = 1 \
                    OR user_response IS NOT NULL)",
        )
        .bind(chat_id)
        .bind(local_date)
        .execute(&self.pool)
        .await
        .map_err(|e| MinderError::Store(format!("rollover failed: {e}")))?;
        Ok(result.rows_affected())
    }
}
