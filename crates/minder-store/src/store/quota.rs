//! Atomic daily budget metering.
//!
//! Reserve is a single conditional UPDATE: a lazy day-boundary reset and the
//! limit check happen inside the statement, never as a read-modify-write pair
//! in application code. `rows_affected > 0` means the reservation is held.
//! A failed reserve is "no budget left today" — callers degrade to canned
//! text and do not retry.

use super::Store;
use minder_core::error::MinderError;

impl Store {
    /// Reserve one call against the main AI budget for the user's local day.
    pub async fn reserve_ai_call(
        &self,
        chat_id: &str,
        local_date: &str,
        limit: u32,
    ) -> Result<bool, MinderError> {
        self.reserve("ai_calls_today", "ai_reset_date", chat_id, local_date, limit)
            .await
    }

    /// Release a held AI reservation after a failed generation.
    pub async fn rollback_ai_call(&self, chat_id: &str) -> Result<(), MinderError> {
        self.rollback("ai_calls_today", chat_id).await
    }

    /// Reserve one call against the secondary "stuck help" budget.
    pub async fn reserve_help_call(
        &self,
        chat_id: &str,
        local_date: &str,
        limit: u32,
    ) -> Result<bool, MinderError> {
        self.reserve(
            "help_calls_today",
            "help_reset_date",
            chat_id,
            local_date,
            limit,
        )
        .await
    }

    /// Release a held help reservation after a failed generation.
    pub async fn rollback_help_call(&self, chat_id: &str) -> Result<(), MinderError> {
        self.rollback("help_calls_today", chat_id).await
    }

    async fn reserve(
        &self,
        counter: &str,
        reset_col: &str,
        chat_id: &str,
        local_date: &str,
        limit: u32,
    ) -> Result<bool, MinderError> {
        // Column names are compile-time constants from the wrappers above;
        // only values are bound.
        let sql = format!(
            "UPDATE users SET \
                 {counter} = CASE WHEN {reset_col} = ?1 THEN {counter} + 1 ELSE 1 END, \
                 {reset_col} = ?1 \
             WHERE chat_id = ?2 AND ({reset_col} <> ?1 OR {counter} < ?3)"
        );
        let result = sqlx::query(&sql)
            .bind(local_date)
            .bind(chat_id)
            .bind(limit as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| MinderError::Store(format!("quota reserve failed: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    async fn rollback(&self, counter: &str, chat_id: &str) -> Result<(), MinderError> {
        let sql = format!("UPDATE users SET {counter} = MAX({counter} - 1, 0) WHERE chat_id = ?");
        sqlx::query(&sql)
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .map_err(|e| MinderError::Store(format!("quota rollback failed: {e}")))?;
        Ok(())
    }
}
