//! Daily rollover: archive-in-place reset of past days' task lifecycle.

use super::{Engine, SweepCounters};
use chrono::{DateTime, Utc};
use minder_core::{error::MinderError, localtime};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Default, Serialize)]
pub struct RolloverReport {
    #[serde(flatten)]
    pub counters: SweepCounters,
    pub tasks_reset: u64,
}

impl Engine {
    /// Reset lifecycle fields on every task dated strictly before each
    /// user's current local date. Safe at any cadence.
    pub async fn run_rollover(&self, now: DateTime<Utc>) -> Result<RolloverReport, MinderError> {
        let mut report = RolloverReport::default();

        for user in self.store.all_users().await? {
            report.counters.users_processed += 1;

            let stamp = localtime::resolve(now, user.utc_offset_min);
            match self
                .store
                .rollover_before(&user.chat_id, &stamp.date_key())
                .await
            {
                Ok(reset) => {
                    if reset > 0 {
                        info!("rolled over {reset} task(s) for {}", user.chat_id);
                    }
                    report.tasks_reset += reset;
                }
                Err(e) => {
                    warn!("rollover for {} failed: {e}", user.chat_id);
                    report.counters.errors += 1;
                }
            }
        }

        Ok(report)
    }
}
