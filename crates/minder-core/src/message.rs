use serde::{Deserialize, Serialize};

/// What kind of text the generator is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenKind {
    Praise,
    Scold,
    MorningGreeting,
    EveningPlanning,
    DailySummary,
    StuckHelp,
}

impl GenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Praise => "praise",
            Self::Scold => "scold",
            Self::MorningGreeting => "morning_greeting",
            Self::EveningPlanning => "evening_planning",
            Self::DailySummary => "daily_summary",
            Self::StuckHelp => "stuck_help",
        }
    }
}

/// A generation request: the kind plus whatever context the caller has
/// (task name, user reply, day numbers). The provider turns this into a
/// prompt; the engine never builds prompts itself.
#[derive(Debug, Clone)]
pub struct GenRequest {
    pub kind: GenKind,
    pub context: String,
}

impl GenRequest {
    pub fn new(kind: GenKind, context: impl Into<String>) -> Self {
        Self {
            kind,
            context: context.into(),
        }
    }
}
