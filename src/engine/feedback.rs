//! Feedback sweep: evaluate follow-through after the scheduled time passed.
//!
//! Outcomes are fail-safe-closed: the terminal flag is always written, even
//! when the quota is exhausted or the generator is down. In those branches
//! the task is marked scolded and no message goes out; the user's day still
//! counts correctly in the summary.

use super::{Engine, SweepCounters};
use chrono::{DateTime, Utc};
use minder_core::{
    classify,
    error::MinderError,
    localtime,
    message::{GenKind, GenRequest},
};
use minder_store::TaskRow;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Default, Serialize)]
pub struct FeedbackReport {
    #[serde(flatten)]
    pub counters: SweepCounters,
    pub praised: u64,
    pub scolded: u64,
}

enum Verdict {
    Praised,
    Scolded,
    /// Another sweep owned the task, or a notification could not be sent
    /// for it; nothing to count.
    Skipped,
}

impl Engine {
    /// Evaluate reminded, non-terminal tasks in the look-back window
    /// `[now - lag_high, now - lag_low]` for every user.
    pub async fn sweep_feedback(
        &self,
        now: DateTime<Utc>,
    ) -> Result<FeedbackReport, MinderError> {
        let mut report = FeedbackReport::default();

        for user in self.store.all_users().await? {
            report.counters.users_processed += 1;

            let stamp = localtime::resolve(now, user.utc_offset_min);
            if stamp.minutes < self.config.feedback_lag_low_min {
                continue;
            }
            let high = stamp.minutes - self.config.feedback_lag_low_min;
            let low = stamp.minutes.saturating_sub(self.config.feedback_lag_high_min);
            let date = stamp.date_key();

            let candidates = match self
                .store
                .feedback_candidates(&user.chat_id, &date, low, high)
                .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    warn!("feedback candidates for {} failed: {e}", user.chat_id);
                    report.counters.errors += 1;
                    continue;
                }
            };

            for task in candidates {
                match self.evaluate_task(&user.chat_id, &date, &task).await {
                    Ok(Verdict::Praised) => report.praised += 1,
                    Ok(Verdict::Scolded) => report.scolded += 1,
                    Ok(Verdict::Skipped) => {}
                    Err(e) => {
                        warn!("feedback for task {} failed: {e}", task.id);
                        report.counters.errors += 1;
                    }
                }
            }
        }

        Ok(report)
    }

    async fn evaluate_task(
        &self,
        chat_id: &str,
        local_date: &str,
        task: &TaskRow,
    ) -> Result<Verdict, MinderError> {
        let deserves_praise = task
            .user_response
            .as_deref()
            .map(|reply| classify::response_matches_task(&task.name, reply))
            .unwrap_or(false);

        // No budget: still close the task, silently.
        if !self
            .store
            .reserve_ai_call(chat_id, local_date, self.config.ai_daily_limit)
            .await?
        {
            debug!("quota exhausted for {chat_id}, closing '{}' silently", task.name);
            self.store.claim_terminal(&task.id, false).await?;
            return Ok(Verdict::Scolded);
        }

        let (kind, context) = match task.user_response.as_deref() {
            Some(reply) if deserves_praise => (
                GenKind::Praise,
                format!("Task: {}. The user replied: {reply}", task.name),
            ),
            Some(reply) => (
                GenKind::Scold,
                format!(
                    "Task: {}. The user replied: {reply} (which does not match the task)",
                    task.name
                ),
            ),
            None => (
                GenKind::Scold,
                format!("Task: {}. The user never replied to the reminder.", task.name),
            ),
        };

        let text = match self.provider.generate(&GenRequest::new(kind, context)).await {
            Ok(text) => text,
            Err(e) => {
                warn!("feedback generation for task {} failed: {e}", task.id);
                self.store.rollback_ai_call(chat_id).await?;
                self.store.claim_terminal(&task.id, false).await?;
                return Ok(Verdict::Scolded);
            }
        };

        if self.store.claim_terminal(&task.id, deserves_praise).await? {
            self.deliver(chat_id, &text).await;
            Ok(if deserves_praise {
                Verdict::Praised
            } else {
                Verdict::Scolded
            })
        } else {
            // Lost the race to a concurrent sweep; release the reservation.
            self.store.rollback_ai_call(chat_id).await?;
            Ok(Verdict::Skipped)
        }
    }
}
