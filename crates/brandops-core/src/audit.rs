//! Audit log entries, query filters, and aggregate statistics.
//!
//! These types are shared by the audit engine (which builds and buffers
//! entries) and the database layer (which persists and queries them).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Hard cap on a single audit query page.
pub const MAX_QUERY_LIMIT: i64 = 1000;
/// Page size used when the caller does not specify one.
pub const DEFAULT_QUERY_LIMIT: i64 = 100;
/// Number of users/services reported in statistics rankings.
pub const TOP_N: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    DecisionMade,
    DecisionOverridden,
    ActionExecuted,
    ActionFailed,
    UserAction,
    UserLogin,
    ConfigurationChanged,
    BrandContextLoaded,
    BrandContextFailed,
    BrandContextEscalation,
    PersonaMatched,
    ComplianceCheck,
    DataQualityCheck,
    SystemStartup,
    SystemShutdown,
    SystemError,
    AuditCleanup,
}

impl AuditEventType {
    pub const ALL: [AuditEventType; 17] = [
        AuditEventType::DecisionMade,
        AuditEventType::DecisionOverridden,
        AuditEventType::ActionExecuted,
        AuditEventType::ActionFailed,
        AuditEventType::UserAction,
        AuditEventType::UserLogin,
        AuditEventType::ConfigurationChanged,
        AuditEventType::BrandContextLoaded,
        AuditEventType::BrandContextFailed,
        AuditEventType::BrandContextEscalation,
        AuditEventType::PersonaMatched,
        AuditEventType::ComplianceCheck,
        AuditEventType::DataQualityCheck,
        AuditEventType::SystemStartup,
        AuditEventType::SystemShutdown,
        AuditEventType::SystemError,
        AuditEventType::AuditCleanup,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuditEventType::DecisionMade => "decision_made",
            AuditEventType::DecisionOverridden => "decision_overridden",
            AuditEventType::ActionExecuted => "action_executed",
            AuditEventType::ActionFailed => "action_failed",
            AuditEventType::UserAction => "user_action",
            AuditEventType::UserLogin => "user_login",
            AuditEventType::ConfigurationChanged => "configuration_changed",
            AuditEventType::BrandContextLoaded => "brand_context_loaded",
            AuditEventType::BrandContextFailed => "brand_context_failed",
            AuditEventType::BrandContextEscalation => "brand_context_escalation",
            AuditEventType::PersonaMatched => "persona_matched",
            AuditEventType::ComplianceCheck => "compliance_check",
            AuditEventType::DataQualityCheck => "data_quality_check",
            AuditEventType::SystemStartup => "system_startup",
            AuditEventType::SystemShutdown => "system_shutdown",
            AuditEventType::SystemError => "system_error",
            AuditEventType::AuditCleanup => "audit_cleanup",
        }
    }
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        AuditEventType::ALL
            .into_iter()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| format!("unknown audit event type '{needle}'"))
    }
}

/// Audit severity. Declaration order is the filtering order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Critical,
}

impl AuditSeverity {
    pub const ALL: [AuditSeverity; 5] = [
        AuditSeverity::Debug,
        AuditSeverity::Info,
        AuditSeverity::Warn,
        AuditSeverity::Error,
        AuditSeverity::Critical,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuditSeverity::Debug => "debug",
            AuditSeverity::Info => "info",
            AuditSeverity::Warn => "warn",
            AuditSeverity::Error => "error",
            AuditSeverity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for AuditSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(AuditSeverity::Debug),
            "info" => Ok(AuditSeverity::Info),
            "warn" | "warning" => Ok(AuditSeverity::Warn),
            "error" => Ok(AuditSeverity::Error),
            "critical" => Ok(AuditSeverity::Critical),
            other => Err(format!("unknown audit severity '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Describes the emitting process. Captured once at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemContext {
    pub service_id: String,
    pub hostname: String,
    pub pid: u32,
    pub environment: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionContext {
    pub decision_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<Uuid>,
    pub decision_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub reasoning: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_taken: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub duration_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_query_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_hit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage_mb: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    pub recoverable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataClassification {
    Public,
    #[default]
    Internal,
    Confidential,
    Restricted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub retention_days: u32,
    pub classification: DataClassification,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            retention_days: 365,
            classification: DataClassification::Internal,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceFlags {
    pub contains_pii: bool,
    pub gdpr_relevant: bool,
    #[serde(default)]
    pub frameworks: Vec<String>,
}

/// One immutable audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub severity: AuditSeverity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_context: Option<UserContext>,
    pub system_context: SystemContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_context: Option<DecisionContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_metrics: Option<PerformanceMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<ErrorDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub retention_policy: RetentionPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_flags: Option<ComplianceFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_event_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_event_ids: Option<Vec<Uuid>>,
}

/// Filters accepted by audit queries and statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilters {
    #[serde(default)]
    pub event_types: Vec<AuditEventType>,
    #[serde(default)]
    pub severities: Vec<AuditSeverity>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Matches entries carrying any of these tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Case-insensitive substring of message or description.
    #[serde(default)]
    pub search_text: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl AuditFilters {
    /// Page size clamped to `1..=MAX_QUERY_LIMIT`.
    #[must_use]
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_QUERY_LIMIT)
            .clamp(1, MAX_QUERY_LIMIT)
    }

    #[must_use]
    pub fn effective_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Search text with surrounding whitespace removed; `None` when blank.
    #[must_use]
    pub fn search_needle(&self) -> Option<&str> {
        self.search_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Evaluates every filter except pagination against `entry`.
    #[must_use]
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if !self.event_types.is_empty() && !self.event_types.contains(&entry.event_type) {
            return false;
        }
        if !self.severities.is_empty() && !self.severities.contains(&entry.severity) {
            return false;
        }
        if let Some(user_id) = &self.user_id {
            let entry_user = entry.user_context.as_ref().map(|u| u.user_id.as_str());
            if entry_user != Some(user_id.as_str()) {
                return false;
            }
        }
        if let Some(service_id) = &self.service_id {
            if &entry.system_context.service_id != service_id {
                return false;
            }
        }
        if self.start_time.is_some_and(|start| entry.timestamp < start) {
            return false;
        }
        if self.end_time.is_some_and(|end| entry.timestamp > end) {
            return false;
        }
        if !self.tags.is_empty() {
            let entry_tags = entry.tags.as_deref().unwrap_or_default();
            if !self.tags.iter().any(|t| entry_tags.contains(t)) {
                return false;
            }
        }
        if let Some(needle) = self.search_needle() {
            let needle = needle.to_lowercase();
            let in_message = entry.message.to_lowercase().contains(&needle);
            let in_description = entry
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_message && !in_description {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyBucket {
    pub hour: DateTime<Utc>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCount {
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAverages {
    pub sample_count: i64,
    pub avg_duration_ms: Option<f64>,
    pub avg_db_query_count: Option<f64>,
    pub cache_hit_rate: Option<f64>,
}

/// Aggregates over the entries matching an [`AuditFilters`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditStatistics {
    pub total_events: i64,
    pub events_by_type: BTreeMap<String, i64>,
    pub events_by_severity: BTreeMap<String, i64>,
    /// Non-empty hourly buckets over the trailing 24 hours, oldest first.
    pub hourly_events: Vec<HourlyBucket>,
    pub top_users: Vec<KeyCount>,
    pub top_services: Vec<KeyCount>,
    pub performance: PerformanceAverages,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(message: &str) -> AuditLogEntry {
        AuditLogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type: AuditEventType::DecisionMade,
            severity: AuditSeverity::Info,
            message: message.to_string(),
            description: None,
            user_context: Some(UserContext {
                user_id: "u-1".to_string(),
                ..UserContext::default()
            }),
            system_context: SystemContext {
                service_id: "svc".to_string(),
                ..SystemContext::default()
            },
            decision_context: None,
            performance_metrics: None,
            error_details: None,
            metadata: None,
            tags: Some(vec!["alpha".to_string(), "beta".to_string()]),
            retention_policy: RetentionPolicy::default(),
            compliance_flags: None,
            parent_event_id: None,
            related_event_ids: None,
        }
    }

    #[test]
    fn severity_order_is_debug_to_critical() {
        assert!(AuditSeverity::Debug < AuditSeverity::Info);
        assert!(AuditSeverity::Info < AuditSeverity::Warn);
        assert!(AuditSeverity::Warn < AuditSeverity::Error);
        assert!(AuditSeverity::Error < AuditSeverity::Critical);
    }

    #[test]
    fn event_type_string_forms_round_trip() {
        for t in AuditEventType::ALL {
            assert_eq!(t.as_str().parse::<AuditEventType>().unwrap(), t);
        }
    }

    #[test]
    fn severity_accepts_warning_alias() {
        assert_eq!("WARNING".parse::<AuditSeverity>().unwrap(), AuditSeverity::Warn);
    }

    #[test]
    fn effective_limit_defaults_and_clamps() {
        let mut filters = AuditFilters::default();
        assert_eq!(filters.effective_limit(), DEFAULT_QUERY_LIMIT);
        filters.limit = Some(5_000);
        assert_eq!(filters.effective_limit(), MAX_QUERY_LIMIT);
        filters.limit = Some(0);
        assert_eq!(filters.effective_limit(), 1);
        filters.offset = Some(-4);
        assert_eq!(filters.effective_offset(), 0);
    }

    #[test]
    fn tags_filter_is_any_match() {
        let e = entry("hello");
        let filters = AuditFilters {
            tags: vec!["gamma".to_string(), "beta".to_string()],
            ..AuditFilters::default()
        };
        assert!(filters.matches(&e));

        let filters = AuditFilters {
            tags: vec!["gamma".to_string()],
            ..AuditFilters::default()
        };
        assert!(!filters.matches(&e));
    }

    #[test]
    fn search_text_is_case_insensitive_substring() {
        let e = entry("Decision made for Brand X");
        let filters = AuditFilters {
            search_text: Some("brand x".to_string()),
            ..AuditFilters::default()
        };
        assert!(filters.matches(&e));
    }

    #[test]
    fn user_filter_rejects_entries_without_user_context() {
        let mut e = entry("anon");
        e.user_context = None;
        let filters = AuditFilters {
            user_id: Some("u-1".to_string()),
            ..AuditFilters::default()
        };
        assert!(!filters.matches(&e));
    }
}
