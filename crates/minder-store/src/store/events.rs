//! Once-per-day idempotency records.

use super::Store;
use minder_core::error::MinderError;

impl Store {
    /// Atomically claim a once-per-day event for a user.
    ///
    /// Returns `true` exactly once per (user, event type, local date); any
    /// later claim — a retried trigger, an overlapping replica — gets `false`.
    pub async fn claim_daily_event(
        &self,
        chat_id: &str,
        event_type: &str,
        local_date: &str,
    ) -> Result<bool, MinderError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO user_events (chat_id, event_type, local_date) VALUES (?, ?, ?)",
        )
        .bind(chat_id)
        .bind(event_type)
        .bind(local_date)
        .execute(&self.pool)
        .await
        .map_err(|e| MinderError::Store(format!("claim event failed: {e}")))?;
        Ok(result.rows_affected() > 0)
    }
}
