use crate::{error::MinderError, message::GenRequest};
use async_trait::async_trait;

/// Text generator seam — the only long-latency collaborator.
///
/// Used by the feedback sweep, the daily aggregator, and the two once-daily
/// notifications. Callers reserve quota before calling `generate` and roll
/// the reservation back when it fails; a failure never blocks a state
/// transition.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Produce text for a request. May fail; callers fall back to canned text.
    async fn generate(&self, request: &GenRequest) -> Result<String, MinderError>;

    /// Check if the provider is reachable and configured.
    async fn is_available(&self) -> bool;
}

/// Messaging channel seam — fire-and-forget outbound delivery.
///
/// Failures are logged by callers and never retried; delivery is
/// at-least-once across trigger invocations, with idempotent effects
/// guaranteed by the store, not the transport.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Send text to a chat handle.
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), MinderError>;
}
