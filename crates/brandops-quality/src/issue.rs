use brandops_core::{AuditSeverity, RuleSeverity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    MissingRequiredField,
    InvalidContentLength,
    InvalidTimestamp,
    InvalidEngagement,
    UnrealisticEngagement,
    MissingAuthorInfo,
    InvalidPlatformId,
    SuspiciousContent,
}

/// Quality dimension an issue type counts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityDimension {
    Completeness,
    Accuracy,
    Consistency,
}

impl IssueType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IssueType::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            IssueType::InvalidContentLength => "INVALID_CONTENT_LENGTH",
            IssueType::InvalidTimestamp => "INVALID_TIMESTAMP",
            IssueType::InvalidEngagement => "INVALID_ENGAGEMENT",
            IssueType::UnrealisticEngagement => "UNREALISTIC_ENGAGEMENT",
            IssueType::MissingAuthorInfo => "MISSING_AUTHOR_INFO",
            IssueType::InvalidPlatformId => "INVALID_PLATFORM_ID",
            IssueType::SuspiciousContent => "SUSPICIOUS_CONTENT",
        }
    }

    #[must_use]
    pub fn dimension(self) -> QualityDimension {
        match self {
            IssueType::MissingRequiredField | IssueType::MissingAuthorInfo => {
                QualityDimension::Completeness
            }
            IssueType::InvalidTimestamp
            | IssueType::InvalidEngagement
            | IssueType::UnrealisticEngagement
            | IssueType::InvalidPlatformId => QualityDimension::Accuracy,
            IssueType::InvalidContentLength | IssueType::SuspiciousContent => {
                QualityDimension::Consistency
            }
        }
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True for severities that make an event invalid.
#[must_use]
pub fn is_blocking(severity: RuleSeverity) -> bool {
    severity >= RuleSeverity::High
}

/// Audit severity used when recording an issue of this severity.
#[must_use]
pub fn audit_severity(severity: RuleSeverity) -> AuditSeverity {
    match severity {
        RuleSeverity::Low => AuditSeverity::Info,
        RuleSeverity::Medium => AuditSeverity::Warn,
        RuleSeverity::High => AuditSeverity::Error,
        RuleSeverity::Critical => AuditSeverity::Critical,
    }
}

/// One failed rule for one event. Only the resolution fields ever change,
/// and only once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQualityIssue {
    pub id: Uuid,
    pub event_id: String,
    pub rule_id: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: RuleSeverity,
    pub message: String,
    pub detected_at: DateTime<Utc>,
    pub resolved: bool,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_by: Option<String>,
    #[serde(default)]
    pub resolution_note: Option<String>,
}
