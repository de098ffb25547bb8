//! Reminder sweep: nudge shortly before each task's scheduled local time.

use super::{format_minute, Engine, SweepCounters};
use chrono::{DateTime, Utc};
use minder_core::{error::MinderError, localtime};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Default, Serialize)]
pub struct ReminderReport {
    #[serde(flatten)]
    pub counters: SweepCounters,
    pub reminders_sent: u64,
}

impl Engine {
    /// Claim and deliver due reminders for every user.
    ///
    /// The look-ahead window is `[now + lead_low, now + lead_high]` in the
    /// user's local minutes. A window that runs past local midnight wraps:
    /// the overflow claims the first minutes of the next local date, so
    /// tasks scheduled right after midnight get their nudge the evening
    /// before, like every other task.
    pub async fn sweep_reminders(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ReminderReport, MinderError> {
        let mut report = ReminderReport::default();

        for user in self.store.all_users().await? {
            report.counters.users_processed += 1;

            let stamp = localtime::resolve(now, user.utc_offset_min);
            let low = stamp.minutes + self.config.reminder_lead_low_min;
            let high = stamp.minutes + self.config.reminder_lead_high_min;

            let mut segments = Vec::new();
            if low <= 1439 {
                segments.push((stamp.date_key(), low, high.min(1439)));
            }
            if high > 1439 {
                if let Some(next) = stamp.tomorrow() {
                    segments.push((
                        next.format("%Y-%m-%d").to_string(),
                        low.saturating_sub(1440),
                        high - 1440,
                    ));
                }
            }

            for (date, seg_low, seg_high) in segments {
                let claimed = match self
                    .store
                    .claim_due_reminders(&user.chat_id, &date, seg_low, seg_high)
                    .await
                {
                    Ok(rows) => rows,
                    Err(e) => {
                        warn!("reminder claim for {} failed: {e}", user.chat_id);
                        report.counters.errors += 1;
                        continue;
                    }
                };

                for (_id, name, minutes) in claimed {
                    debug!("reminding {} about '{name}' at {minutes}", user.chat_id);
                    let text = format!(
                        "Coming up at {}: {name}. You've got this.",
                        format_minute(minutes)
                    );
                    if self.deliver(&user.chat_id, &text).await {
                        report.reminders_sent += 1;
                    }
                }
            }
        }

        Ok(report)
    }
}
