//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "minder".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_db_path() -> String {
    "~/.minder/data/minder.db".to_string()
}

pub fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

pub fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

pub fn default_api_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_api_port() -> u16 {
    8787
}

pub fn default_ai_daily_limit() -> u32 {
    20
}

pub fn default_help_daily_limit() -> u32 {
    5
}

pub fn default_success_threshold() -> f64 {
    0.7
}

pub fn default_reminder_lead_low() -> u32 {
    8
}

pub fn default_reminder_lead_high() -> u32 {
    22
}

pub fn default_feedback_lag_low() -> u32 {
    3
}

pub fn default_feedback_lag_high() -> u32 {
    25
}

pub fn default_sweep_cadence() -> u32 {
    5
}

// 07:00 local.
pub fn default_greeting_minute() -> u32 {
    420
}

// 21:00 local.
pub fn default_planning_minute() -> u32 {
    1260
}

// 23:00 local.
pub fn default_summary_minute() -> u32 {
    1380
}
