//! OpenAI-compatible chat completion provider.
//!
//! Works with OpenAI's API and any compatible endpoint. The engine hands
//! over a [`GenRequest`]; the instruction for each kind lives here.

use async_trait::async_trait;
use minder_core::{
    error::MinderError,
    message::{GenKind, GenRequest},
    traits::Provider,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// OpenAI-compatible provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    /// Create from config values.
    pub fn from_config(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }
}

/// System instruction for a generation kind. Short on purpose: every reply
/// goes to a chat message, not a document.
fn instruction(kind: GenKind) -> &'static str {
    match kind {
        GenKind::Praise => {
            "You are an accountability coach. The user did what they planned. \
             Write one short, warm, specific congratulation. One or two sentences, \
             no emoji spam, no questions."
        }
        GenKind::Scold => {
            "You are an accountability coach. The user skipped a task they planned \
             or did something else instead. Write one short, firm but kind nudge to \
             get back on track. One or two sentences, never insulting."
        }
        GenKind::MorningGreeting => {
            "You are an accountability coach. Write a short morning greeting that \
             reminds the user to plan their day. Two sentences at most."
        }
        GenKind::EveningPlanning => {
            "You are an accountability coach. Write a short evening prompt asking \
             the user to plan tomorrow's tasks. Two sentences at most."
        }
        GenKind::DailySummary => {
            "You are an accountability coach. Given today's planned and completed \
             counts and the current streak, write a short end-of-day summary. \
             Honest about misses, encouraging about the streak. Three sentences at most."
        }
        GenKind::StuckHelp => {
            "You are an accountability coach. The user is stuck on a task. Give one \
             concrete, small first step to get moving. Two or three sentences."
        }
    }
}

/// Build the two-message prompt: instruction as system, context as user.
pub(crate) fn build_messages(request: &GenRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".to_string(),
            content: instruction(request.kind).to_string(),
        },
        ChatMessage {
            role: "user".to_string(),
            content: request.context.clone(),
        },
    ]
}

#[derive(Serialize, Deserialize, Clone)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Option<Vec<ChatChoice>>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub message: Option<ChatMessage>,
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &GenRequest) -> Result<String, MinderError> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: build_messages(request),
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!("openai: POST {url} kind={}", request.kind.as_str());

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| MinderError::Provider(format!("openai request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(MinderError::Provider(format!(
                "openai returned {status}: {text}"
            )));
        }

        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| MinderError::Provider(format!("openai: failed to parse response: {e}")))?;

        parsed
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message)
            .map(|m| m.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| MinderError::Provider("openai returned no content".to_string()))
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            warn!("openai: no API key configured");
            return false;
        }
        // Basic check: try to list models.
        let url = format!("{}/models", self.base_url.trim_end_matches('/'));
        match self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("openai not available: {e}");
                false
            }
        }
    }
}
