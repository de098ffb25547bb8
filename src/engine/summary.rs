//! Daily aggregator: end-of-day rollup and streak update, once per user-day.

use super::{Engine, SweepCounters};
use chrono::{DateTime, Utc};
use minder_core::{
    error::MinderError,
    localtime,
    message::{GenKind, GenRequest},
};
use minder_store::UserRow;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Default, Serialize)]
pub struct SummaryReport {
    #[serde(flatten)]
    pub counters: SweepCounters,
    pub summaries_sent: u64,
}

impl Engine {
    /// Run the daily aggregator for every user whose local clock has passed
    /// the summary minute.
    ///
    /// Double-gated: `last_summary_date` plus the `daily_summary` event
    /// claim. Early, late, or repeated triggers never double-count a streak.
    pub async fn run_summaries(
        &self,
        now: DateTime<Utc>,
    ) -> Result<SummaryReport, MinderError> {
        let mut report = SummaryReport::default();

        for user in self.store.all_users().await? {
            report.counters.users_processed += 1;
            match self.summarize_user(&user, now).await {
                Ok(true) => report.summaries_sent += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("summary for {} failed: {e}", user.chat_id);
                    report.counters.errors += 1;
                }
            }
        }

        Ok(report)
    }

    async fn summarize_user(
        &self,
        user: &UserRow,
        now: DateTime<Utc>,
    ) -> Result<bool, MinderError> {
        let stamp = localtime::resolve(now, user.utc_offset_min);
        if stamp.minutes < self.config.summary_minute {
            return Ok(false);
        }
        let today = stamp.date_key();

        let stats = self.store.get_stats(&user.chat_id).await?;
        if stats.last_summary_date.as_deref() == Some(today.as_str()) {
            return Ok(false);
        }

        // Check there is anything to report before consuming the one-shot
        // event claim, so an empty early trigger does not burn the day.
        let (planned, completed) = self.store.day_counts(&user.chat_id, &today).await?;
        if planned == 0 {
            debug!("{}: nothing planned today, no summary", user.chat_id);
            return Ok(false);
        }

        if !self
            .store
            .claim_daily_event(&user.chat_id, "daily_summary", &today)
            .await?
        {
            return Ok(false);
        }

        let success = completed as f64 / planned as f64 >= self.config.success_threshold;
        let yesterday = stamp
            .yesterday()
            .map(|d| d.format("%Y-%m-%d").to_string());

        let current = if success {
            if stats.last_success_date == yesterday && yesterday.is_some() {
                stats.current_streak + 1
            } else {
                1
            }
        } else {
            0
        };
        let longest = stats.longest_streak.max(current);
        let last_success = if success {
            Some(today.as_str())
        } else {
            stats.last_success_date.as_deref()
        };

        self.store
            .upsert_stats(&user.chat_id, current, longest, last_success, &today)
            .await?;

        let missed = planned - completed;
        let context = format!(
            "Planned today: {planned}. Completed: {completed}. Missed: {missed}. \
             Current streak: {current} day(s), longest ever: {longest}."
        );
        let fallback = format!(
            "Today's recap: {completed}/{planned} tasks done. Streak: {current} day(s)."
        );
        let text = self
            .metered_text(
                &user.chat_id,
                &today,
                GenRequest::new(GenKind::DailySummary, context),
                fallback,
            )
            .await?;
        self.deliver(&user.chat_id, &text).await;
        Ok(true)
    }
}
