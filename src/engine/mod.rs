//! The sweep engine.
//!
//! Every durable transition behind the trigger API lives here. Sweeps are
//! re-entrant: any trigger may fire early, late, twice, or concurrently with
//! another replica, and the store's conditional statements guarantee each
//! effect happens at most once per task per day.

mod feedback;
mod inbound;
mod notify;
mod reminder;
mod rollover;
mod summary;


use minder_core::{
    config::EngineConfig,
    error::MinderError,
    message::GenRequest,
    traits::{Channel, Provider},
};
use minder_store::Store;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

pub use feedback::FeedbackReport;
pub use notify::NotifyReport;
pub use reminder::ReminderReport;
pub use rollover::RolloverReport;
pub use summary::SummaryReport;

/// Shared state for all sweeps and inbound handling.
pub struct Engine {
    store: Store,
    provider: Arc<dyn Provider>,
    channel: Arc<dyn Channel>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        store: Store,
        provider: Arc<dyn Provider>,
        channel: Arc<dyn Channel>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            provider,
            channel,
            config,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Reserve main-budget quota, generate, and fall back to canned text.
    ///
    /// Quota exhaustion and generation failure both degrade to `fallback`;
    /// a failed generation releases its reservation first.
    async fn metered_text(
        &self,
        chat_id: &str,
        local_date: &str,
        request: GenRequest,
        fallback: String,
    ) -> Result<String, MinderError> {
        if !self
            .store
            .reserve_ai_call(chat_id, local_date, self.config.ai_daily_limit)
            .await?
        {
            return Ok(fallback);
        }
        match self.provider.generate(&request).await {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(
                    "generation ({}) for {chat_id} failed: {e}",
                    request.kind.as_str()
                );
                self.store.rollback_ai_call(chat_id).await?;
                Ok(fallback)
            }
        }
    }

    /// Fire-and-forget delivery; failures are logged, never propagated.
    async fn deliver(&self, chat_id: &str, text: &str) -> bool {
        match self.channel.send(chat_id, text).await {
            Ok(()) => true,
            Err(e) => {
                warn!("delivery to {chat_id} via {} failed: {e}", self.channel.name());
                false
            }
        }
    }
}

/// Render minutes-of-day as `HH:MM`.
pub(crate) fn format_minute(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Rollup counters common to every trigger response.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SweepCounters {
    pub users_processed: u64,
    pub errors: u64,
}
