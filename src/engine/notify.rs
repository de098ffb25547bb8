//! Once-daily notifications: morning greeting and evening planning prompt.

use super::{Engine, SweepCounters};
use chrono::{DateTime, Utc};
use minder_core::{
    error::MinderError,
    localtime,
    message::{GenKind, GenRequest},
};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Default, Serialize)]
pub struct NotifyReport {
    #[serde(flatten)]
    pub counters: SweepCounters,
    pub notifications_sent: u64,
}

impl Engine {
    /// Morning greeting, once per user-day after the greeting minute.
    pub async fn run_morning(&self, now: DateTime<Utc>) -> Result<NotifyReport, MinderError> {
        self.run_notification(
            now,
            GenKind::MorningGreeting,
            "morning_greeting",
            self.config.greeting_minute,
            "Good morning! What are you planning to get done today?",
        )
        .await
    }

    /// Evening planning prompt, once per user-day after the planning minute.
    pub async fn run_evening(&self, now: DateTime<Utc>) -> Result<NotifyReport, MinderError> {
        self.run_notification(
            now,
            GenKind::EveningPlanning,
            "evening_planning",
            self.config.planning_minute,
            "Evening check-in: take a minute to plan tomorrow's tasks.",
        )
        .await
    }

    /// The trigger cadence does not matter: the local-minute threshold keeps
    /// the message after the right hour and the event claim keeps it to one
    /// per day, so a cron firing every five minutes is as safe as one firing
    /// exactly on time.
    async fn run_notification(
        &self,
        now: DateTime<Utc>,
        kind: GenKind,
        event_type: &str,
        threshold_minute: u32,
        fallback: &str,
    ) -> Result<NotifyReport, MinderError> {
        let mut report = NotifyReport::default();

        for user in self.store.all_users().await? {
            report.counters.users_processed += 1;

            let stamp = localtime::resolve(now, user.utc_offset_min);
            if stamp.minutes < threshold_minute {
                continue;
            }
            let today = stamp.date_key();

            let sent = async {
                if !self
                    .store
                    .claim_daily_event(&user.chat_id, event_type, &today)
                    .await?
                {
                    return Ok::<bool, MinderError>(false);
                }
                let (planned, completed) = self.store.day_counts(&user.chat_id, &today).await?;
                let context = format!(
                    "The user has {planned} task(s) planned today, {completed} already done."
                );
                let text = self
                    .metered_text(
                        &user.chat_id,
                        &today,
                        GenRequest::new(kind, context),
                        fallback.to_string(),
                    )
                    .await?;
                self.deliver(&user.chat_id, &text).await;
                Ok(true)
            }
            .await;

            match sent {
                Ok(true) => report.notifications_sent += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("{event_type} for {} failed: {e}", user.chat_id);
                    report.counters.errors += 1;
                }
            }
        }

        Ok(report)
    }
}
