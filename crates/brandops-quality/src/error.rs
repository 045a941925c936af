use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum QualityError {
    #[error("data quality issue {0} not found")]
    IssueNotFound(Uuid),
}

/// Raised by a rule condition that cannot evaluate an event. The rule is
/// skipped for that event.
#[derive(Debug, Error)]
#[error("rule {rule_id} failed: {reason}")]
pub struct RuleError {
    pub rule_id: String,
    pub reason: String,
}

impl RuleError {
    pub fn new(rule_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            reason: reason.into(),
        }
    }
}
