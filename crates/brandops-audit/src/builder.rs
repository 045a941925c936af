use brandops_core::{
    AuditEventType, AuditLogEntry, AuditSeverity, ComplianceFlags, DecisionContext,
    ErrorDetails, PerformanceMetrics, RetentionPolicy, SystemContext, UserContext,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Describes the current process. Called once at startup.
#[must_use]
pub fn capture_system_context(service_id: &str, environment: &str) -> SystemContext {
    SystemContext {
        service_id: service_id.to_string(),
        hostname: local_hostname(),
        pid: std::process::id(),
        environment: environment.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        correlation_id: None,
        request_id: None,
    }
}

fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().trim().to_string())
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Builds one [`AuditLogEntry`].
///
/// Every setter overwrites the previous value. The entry id is assigned by
/// [`AuditEventBuilder::build`].
#[derive(Debug, Clone)]
#[must_use]
pub struct AuditEventBuilder {
    entry: AuditLogEntry,
}

impl AuditEventBuilder {
    pub fn new(
        event_type: AuditEventType,
        message: impl Into<String>,
        system_context: SystemContext,
    ) -> Self {
        Self {
            entry: AuditLogEntry {
                id: Uuid::nil(),
                timestamp: Utc::now(),
                event_type,
                severity: AuditSeverity::Info,
                message: message.into(),
                description: None,
                user_context: None,
                system_context,
                decision_context: None,
                performance_metrics: None,
                error_details: None,
                metadata: None,
                tags: None,
                retention_policy: RetentionPolicy::default(),
                compliance_flags: None,
                parent_event_id: None,
                related_event_ids: None,
            },
        }
    }

    pub fn severity(mut self, severity: AuditSeverity) -> Self {
        self.entry.severity = severity;
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.entry.timestamp = timestamp;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.entry.description = Some(description.into());
        self
    }

    pub fn user(mut self, user: UserContext) -> Self {
        self.entry.user_context = Some(user);
        self
    }

    pub fn decision(mut self, decision: DecisionContext) -> Self {
        self.entry.decision_context = Some(decision);
        self
    }

    pub fn performance(mut self, metrics: PerformanceMetrics) -> Self {
        self.entry.performance_metrics = Some(metrics);
        self
    }

    /// Shorthand for a performance block carrying only a duration.
    pub fn duration_ms(self, duration_ms: f64) -> Self {
        self.performance(PerformanceMetrics {
            duration_ms,
            ..PerformanceMetrics::default()
        })
    }

    pub fn error(mut self, error: ErrorDetails) -> Self {
        self.entry.error_details = Some(error);
        self
    }

    /// Sets a single metadata key, keeping the others.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entry
            .metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replaces the whole metadata map.
    pub fn metadata_map(mut self, metadata: Map<String, Value>) -> Self {
        self.entry.metadata = Some(metadata);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn retention(mut self, policy: RetentionPolicy) -> Self {
        self.entry.retention_policy = policy;
        self
    }

    pub fn compliance(mut self, flags: ComplianceFlags) -> Self {
        self.entry.compliance_flags = Some(flags);
        self
    }

    pub fn parent(mut self, parent_event_id: Uuid) -> Self {
        self.entry.parent_event_id = Some(parent_event_id);
        self
    }

    pub fn related(mut self, related_event_ids: Vec<Uuid>) -> Self {
        self.entry.related_event_ids = Some(related_event_ids);
        self
    }

    pub fn correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.entry.system_context.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.entry.system_context.request_id = Some(request_id.into());
        self
    }

    #[must_use]
    pub fn build(self) -> AuditLogEntry {
        AuditLogEntry {
            id: Uuid::new_v4(),
            ..self.entry
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> AuditEventBuilder {
        AuditEventBuilder::new(
            AuditEventType::UserAction,
            "clicked approve",
            capture_system_context("svc", "test"),
        )
    }

    #[test]
    fn defaults_to_info_and_process_context() {
        let entry = builder().build();
        assert_eq!(entry.severity, AuditSeverity::Info);
        assert_eq!(entry.system_context.service_id, "svc");
        assert_eq!(entry.system_context.pid, std::process::id());
        assert!(!entry.id.is_nil());
    }

    #[test]
    fn hostname_comes_from_the_os() {
        let expected = hostname::get()
            .map(|h| h.to_string_lossy().trim().to_string())
            .unwrap_or_default();
        let context = capture_system_context("svc", "test");
        assert!(!context.hostname.is_empty());
        if !expected.is_empty() {
            assert_eq!(context.hostname, expected);
        }
    }

    #[test]
    fn last_write_wins() {
        let entry = builder()
            .severity(AuditSeverity::Debug)
            .severity(AuditSeverity::Error)
            .description("first")
            .description("second")
            .build();
        assert_eq!(entry.severity, AuditSeverity::Error);
        assert_eq!(entry.description.as_deref(), Some("second"));
    }

    #[test]
    fn metadata_keys_accumulate() {
        let entry = builder()
            .metadata("a", 1)
            .metadata("b", "two")
            .metadata("a", 3)
            .build();
        let metadata = entry.metadata.expect("metadata");
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata["a"], Value::from(3));
    }

    #[test]
    fn each_build_gets_a_fresh_id() {
        let b = builder();
        let first = b.clone().build();
        let second = b.build();
        assert_ne!(first.id, second.id);
    }
}
