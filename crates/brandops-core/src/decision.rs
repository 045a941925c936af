//! Decisions produced by the external decision engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    AutoRespond,
    SuggestResponse,
    Escalate,
    Ignore,
}

impl DecisionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionType::AutoRespond => "auto_respond",
            DecisionType::SuggestResponse => "suggest_response",
            DecisionType::Escalate => "escalate",
            DecisionType::Ignore => "ignore",
        }
    }
}

impl std::fmt::Display for DecisionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A routing decision for one social event. Consumed here only for auditing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionOutput {
    pub decision_id: Uuid,
    pub event_id: String,
    pub brand_id: Uuid,
    pub decision_type: DecisionType,
    pub confidence: f64,
    #[serde(default)]
    pub persona_id: Option<Uuid>,
    #[serde(default)]
    pub reasoning: Vec<String>,
    #[serde(default)]
    pub suggested_response: Option<String>,
    #[serde(default)]
    pub processing_time_ms: u64,
}
