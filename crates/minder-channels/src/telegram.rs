//! Telegram Bot API channel, outbound only.
//!
//! Inbound text arrives through the webhook surface; this module just
//! delivers via `sendMessage`. Docs: <https://core.telegram.org/bots/api>

use async_trait::async_trait;
use minder_core::{config::TelegramConfig, error::MinderError, traits::Channel};
use tracing::{debug, warn};

const MAX_MESSAGE_LEN: usize = 4096;

/// Telegram channel using the Bot API.
pub struct TelegramChannel {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramChannel {
    /// Create a new Telegram channel from config.
    pub fn new(config: &TelegramConfig) -> Self {
        let base_url = format!("https://api.telegram.org/bot{}", config.bot_token);
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    async fn send_chunk(&self, chat_id: &str, chunk: &str) -> Result<(), MinderError> {
        let url = format!("{}/sendMessage", self.base_url);
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": chunk,
            "parse_mode": "Markdown",
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| MinderError::Channel(format!("telegram send failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            if error_text.contains("can't parse entities") {
                debug!("Markdown parse failed, retrying as plain text");
                let plain_body = serde_json::json!({
                    "chat_id": chat_id,
                    "text": chunk,
                });
                let plain_resp = self
                    .client
                    .post(&url)
                    .json(&plain_body)
                    .send()
                    .await
                    .map_err(|e| {
                        MinderError::Channel(format!("telegram send (plain) failed: {e}"))
                    })?;
                let plain_status = plain_resp.status();
                if !plain_status.is_success() {
                    let plain_text = plain_resp.text().await.unwrap_or_default();
                    return Err(MinderError::Channel(format!(
                        "telegram send (plain) got {plain_status}: {plain_text}"
                    )));
                }
            } else {
                warn!("telegram send got {status}: {error_text}");
                return Err(MinderError::Channel(format!(
                    "telegram send got {status}: {error_text}"
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, chat_id: &str, text: &str) -> Result<(), MinderError> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            self.send_chunk(chat_id, chunk).await?;
        }
        Ok(())
    }
}

/// Split on newlines to stay under Telegram's message size cap.
///
/// Slice boundaries are aligned to UTF-8 char boundaries so multi-byte
/// content (Cyrillic, CJK, emoji) never panics the slicer.
fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let break_at = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .map(|i| start + i + 1)
                .unwrap_or(end)
        } else {
            end
        };
        chunks.push(&text[start..break_at]);
        start = break_at;
    }

    chunks
}
