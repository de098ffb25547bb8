mod defaults;


use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::error::MinderError;
use defaults::*;

/// Top-level minder configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub minder: MinderConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// General agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinderConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for MinderConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

/// Store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Channel config. Telegram is the only built-in channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub telegram: Option<TelegramConfig>,
}

/// Telegram Bot API settings (outbound only; inbound arrives via the API).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bot_token: String,
}

/// Provider config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub openai: Option<OpenAiConfig>,
}

/// OpenAI-compatible generator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            api_key: String::new(),
            model: default_openai_model(),
        }
    }
}

/// Trigger API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Shared secret for bearer auth. Empty = no auth (local-only setups).
    #[serde(default)]
    pub shared_secret: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            shared_secret: String::new(),
        }
    }
}

/// Engine constants: quotas, windows, thresholds. These form the external
/// contract of the scheduling engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Daily AI-call budget per user.
    #[serde(default = "default_ai_daily_limit")]
    pub ai_daily_limit: u32,
    /// Daily budget for the on-demand "stuck" help feature.
    #[serde(default = "default_help_daily_limit")]
    pub help_daily_limit: u32,
    /// completed/planned ratio counting as a successful day.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: f64,
    /// Reminder look-ahead window, minutes before the scheduled time.
    #[serde(default = "default_reminder_lead_low")]
    pub reminder_lead_low_min: u32,
    #[serde(default = "default_reminder_lead_high")]
    pub reminder_lead_high_min: u32,
    /// Feedback look-back window, minutes after the scheduled time.
    #[serde(default = "default_feedback_lag_low")]
    pub feedback_lag_low_min: u32,
    #[serde(default = "default_feedback_lag_high")]
    pub feedback_lag_high_min: u32,
    /// Expected external trigger cadence; both windows must be wider.
    #[serde(default = "default_sweep_cadence")]
    pub sweep_cadence_min: u32,
    /// Local minutes-of-day after which the morning greeting may fire.
    #[serde(default = "default_greeting_minute")]
    pub greeting_minute: u32,
    /// Local minutes-of-day after which the evening planning prompt may fire.
    #[serde(default = "default_planning_minute")]
    pub planning_minute: u32,
    /// Local minutes-of-day after which the daily summary may run.
    #[serde(default = "default_summary_minute")]
    pub summary_minute: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ai_daily_limit: default_ai_daily_limit(),
            help_daily_limit: default_help_daily_limit(),
            success_threshold: default_success_threshold(),
            reminder_lead_low_min: default_reminder_lead_low(),
            reminder_lead_high_min: default_reminder_lead_high(),
            feedback_lag_low_min: default_feedback_lag_low(),
            feedback_lag_high_min: default_feedback_lag_high(),
            sweep_cadence_min: default_sweep_cadence(),
            greeting_minute: default_greeting_minute(),
            planning_minute: default_planning_minute(),
            summary_minute: default_summary_minute(),
        }
    }
}

impl Config {
    /// Check invariants the engine depends on.
    ///
    /// The window checks are the load-bearing ones: a window narrower than
    /// the sweep cadence can skip tasks entirely, and a feedback window that
    /// does not start after the scheduled time would evaluate tasks before
    /// the user could plausibly respond.
    pub fn validate(&self) -> Result<(), MinderError> {
        let e = &self.engine;

        if e.ai_daily_limit == 0 || e.help_daily_limit == 0 {
            return Err(MinderError::Config(
                "daily limits must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&e.success_threshold) {
            return Err(MinderError::Config(format!(
                "success_threshold {} outside [0, 1]",
                e.success_threshold
            )));
        }
        if e.reminder_lead_low_min >= e.reminder_lead_high_min {
            return Err(MinderError::Config(
                "reminder_lead_low_min must be below reminder_lead_high_min".into(),
            ));
        }
        if e.feedback_lag_low_min >= e.feedback_lag_high_min {
            return Err(MinderError::Config(
                "feedback_lag_low_min must be below feedback_lag_high_min".into(),
            ));
        }
        if e.reminder_lead_high_min - e.reminder_lead_low_min <= e.sweep_cadence_min {
            return Err(MinderError::Config(
                "reminder window must be wider than the sweep cadence".into(),
            ));
        }
        if e.feedback_lag_high_min - e.feedback_lag_low_min <= e.sweep_cadence_min {
            return Err(MinderError::Config(
                "feedback window must be wider than the sweep cadence".into(),
            ));
        }
        if e.feedback_lag_low_min == 0 {
            return Err(MinderError::Config(
                "feedback_lag_low_min must be at least 1 so evaluation starts after the scheduled time".into(),
            ));
        }
        for (name, m) in [
            ("greeting_minute", e.greeting_minute),
            ("planning_minute", e.planning_minute),
            ("summary_minute", e.summary_minute),
        ] {
            if m >= 1440 {
                return Err(MinderError::Config(format!("{name} {m} outside [0, 1440)")));
            }
        }
        Ok(())
    }
}

/// Load config from a toml file, apply env overrides, and validate.
///
/// A missing file is not an error — defaults apply, which is enough for
/// `minder status` and for test setups.
pub fn load(path: &str) -> Result<Config, MinderError> {
    let mut config: Config = if Path::new(path).exists() {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MinderError::Config(format!("failed to read {path}: {e}")))?;
        toml::from_str(&raw)
            .map_err(|e| MinderError::Config(format!("failed to parse {path}: {e}")))?
    } else {
        warn!("config file {path} not found, using defaults");
        Config::default()
    };

    // Secrets can come from the environment instead of the file.
    if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
        let tg = config.channel.telegram.get_or_insert_with(|| TelegramConfig {
            enabled: true,
            bot_token: String::new(),
        });
        tg.bot_token = token;
    }
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        config
            .provider
            .openai
            .get_or_insert_with(OpenAiConfig::default)
            .api_key = key;
    }
    if let Ok(secret) = std::env::var("MINDER_SHARED_SECRET") {
        config.api.shared_secret = secret;
    }

    config.validate()?;
    info!("config loaded from {path}");
    Ok(config)
}
