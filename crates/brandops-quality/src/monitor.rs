//! Event validation, issue tracking, and running quality metrics.

use std::collections::BTreeMap;
use std::sync::Arc;

use brandops_audit::AuditService;
use brandops_core::{Platform, RuleSeverity, SocialEvent, UserContext};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::issue::{audit_severity, is_blocking, DataQualityIssue, IssueType, QualityDimension};
use crate::report::{
    build_report, dimension_score, ratio_score, PlatformQuality, QualityMetrics, QualityReport,
};
use crate::rules::{builtin_rules, QualityRule, RuleContext};
use crate::QualityError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Oldest issues are dropped once this many are stored.
    pub max_stored_issues: usize,
    pub notification_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_stored_issues: 10_000,
            notification_capacity: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub event_id: String,
    pub is_valid: bool,
    pub issues: Vec<DataQualityIssue>,
}

/// Broadcast once per monitored event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationNotification {
    pub event_id: String,
    pub platform: Platform,
    pub is_valid: bool,
    pub issue_ids: Vec<Uuid>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Counters {
    total: u64,
    valid: u64,
    issues_total: u64,
    by_type: BTreeMap<IssueType, u64>,
    by_severity: BTreeMap<RuleSeverity, u64>,
    max_severity: BTreeMap<IssueType, RuleSeverity>,
    platforms: BTreeMap<Platform, PlatformQuality>,
}

impl Counters {
    fn record(&mut self, platform: Platform, is_valid: bool, issues: &[DataQualityIssue]) {
        let issue_count = issues.len() as u64;
        self.total += 1;
        self.issues_total += issue_count;
        let per_platform = self.platforms.entry(platform).or_default();
        per_platform.processed += 1;
        per_platform.issues += issue_count;
        if is_valid {
            self.valid += 1;
            per_platform.valid += 1;
        }
        for issue in issues {
            *self.by_type.entry(issue.issue_type).or_default() += 1;
            *self.by_severity.entry(issue.severity).or_default() += 1;
            let max = self
                .max_severity
                .entry(issue.issue_type)
                .or_insert(issue.severity);
            *max = (*max).max(issue.severity);
        }
    }

    fn dimension_issues(&self, dimension: QualityDimension) -> u64 {
        self.by_type
            .iter()
            .filter(|(issue_type, _)| issue_type.dimension() == dimension)
            .map(|(_, count)| count)
            .sum()
    }
}

#[derive(Debug, Default)]
struct MonitorState {
    issues: Vec<DataQualityIssue>,
    counters: Counters,
}

/// Runs the rule set over inbound events and tracks the issues they raise.
pub struct DataQualityMonitor {
    config: MonitorConfig,
    rules: RwLock<Vec<QualityRule>>,
    state: RwLock<MonitorState>,
    notifications: broadcast::Sender<ValidationNotification>,
    audit: Option<Arc<AuditService>>,
}

impl DataQualityMonitor {
    /// A monitor loaded with [`builtin_rules`].
    #[must_use]
    pub fn new(config: MonitorConfig, audit: Option<Arc<AuditService>>) -> Self {
        Self::with_rules(config, builtin_rules(), audit)
    }

    #[must_use]
    pub fn with_rules(
        config: MonitorConfig,
        rules: Vec<QualityRule>,
        audit: Option<Arc<AuditService>>,
    ) -> Self {
        let (notifications, _) = broadcast::channel(config.notification_capacity.max(1));
        Self {
            config,
            rules: RwLock::new(rules),
            state: RwLock::new(MonitorState::default()),
            notifications,
            audit,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ValidationNotification> {
        self.notifications.subscribe()
    }

    // -----------------------------------------------------------------------
    // Rule registry
    // -----------------------------------------------------------------------

    /// Adds a rule, replacing any existing rule with the same id.
    pub async fn add_rule(&self, rule: QualityRule) {
        let mut rules = self.rules.write().await;
        rules.retain(|r| r.id != rule.id);
        rules.push(rule);
    }

    pub async fn remove_rule(&self, rule_id: &str) -> bool {
        let mut rules = self.rules.write().await;
        let before = rules.len();
        rules.retain(|r| r.id != rule_id);
        rules.len() != before
    }

    /// Returns `false` when no rule has that id.
    pub async fn set_rule_enabled(&self, rule_id: &str, enabled: bool) -> bool {
        let mut rules = self.rules.write().await;
        match rules.iter_mut().find(|r| r.id == rule_id) {
            Some(rule) => {
                rule.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub async fn rules(&self) -> Vec<QualityRule> {
        self.rules.read().await.clone()
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Evaluates every enabled rule that applies to the event's platform.
    /// A rule that errors is logged and skipped.
    pub async fn validate_event(&self, event: &SocialEvent) -> Vec<DataQualityIssue> {
        let ctx = RuleContext { now: Utc::now() };
        let rules = self.rules.read().await;
        let mut issues = Vec::new();
        for rule in rules.iter().filter(|r| r.applies_to(event.platform)) {
            match (rule.condition)(event, &ctx) {
                Ok(true) => {}
                Ok(false) => issues.push(DataQualityIssue {
                    id: Uuid::new_v4(),
                    event_id: event.id.clone(),
                    rule_id: rule.id.clone(),
                    issue_type: rule.issue_type,
                    severity: rule.severity,
                    message: (rule.message)(event),
                    detected_at: ctx.now,
                    resolved: false,
                    resolved_at: None,
                    resolved_by: None,
                    resolution_note: None,
                }),
                Err(e) => {
                    tracing::warn!(
                        rule_id = %rule.id,
                        event_id = %event.id,
                        error = %e,
                        "quality rule failed to evaluate, skipping"
                    );
                }
            }
        }
        issues
    }

    /// Validates the event, records its issues and counters, notifies
    /// subscribers, and audits each issue.
    pub async fn monitor_event(&self, event: &SocialEvent) -> ValidationOutcome {
        let issues = self.validate_event(event).await;
        let is_valid = !issues.iter().any(|i| is_blocking(i.severity));

        {
            let mut state = self.state.write().await;
            state.counters.record(event.platform, is_valid, &issues);
            state.issues.extend(issues.iter().cloned());
            let overflow = state
                .issues
                .len()
                .saturating_sub(self.config.max_stored_issues);
            if overflow > 0 {
                state.issues.drain(..overflow);
            }
        }

        if !issues.is_empty() {
            tracing::debug!(
                event_id = %event.id,
                platform = %event.platform,
                issues = issues.len(),
                is_valid,
                "data quality issues detected"
            );
        }

        // Err only means there are no subscribers.
        let _ = self.notifications.send(ValidationNotification {
            event_id: event.id.clone(),
            platform: event.platform,
            is_valid,
            issue_ids: issues.iter().map(|i| i.id).collect(),
            checked_at: Utc::now(),
        });

        if let Some(audit) = &self.audit {
            for issue in &issues {
                if let Err(e) = audit
                    .log_data_quality_check(
                        &issue.event_id,
                        issue.id,
                        issue.issue_type.as_str(),
                        audit_severity(issue.severity),
                        &issue.message,
                    )
                    .await
                {
                    tracing::warn!(error = %e, issue_id = %issue.id, "failed to audit data quality issue");
                }
            }
        }

        ValidationOutcome {
            event_id: event.id.clone(),
            is_valid,
            issues,
        }
    }

    // -----------------------------------------------------------------------
    // Issues
    // -----------------------------------------------------------------------

    pub async fn issues(&self, unresolved_only: bool) -> Vec<DataQualityIssue> {
        self.state
            .read()
            .await
            .issues
            .iter()
            .filter(|i| !unresolved_only || !i.resolved)
            .cloned()
            .collect()
    }

    pub async fn issue(&self, id: Uuid) -> Option<DataQualityIssue> {
        self.state
            .read()
            .await
            .issues
            .iter()
            .find(|i| i.id == id)
            .cloned()
    }

    /// Marks an issue resolved. Resolving an already-resolved issue returns
    /// it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`QualityError::IssueNotFound`] if no stored issue has `id`.
    pub async fn resolve_issue(
        &self,
        id: Uuid,
        resolved_by: &str,
        note: Option<String>,
    ) -> Result<DataQualityIssue, QualityError> {
        let resolved = {
            let mut state = self.state.write().await;
            let issue = state
                .issues
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or(QualityError::IssueNotFound(id))?;
            if issue.resolved {
                return Ok(issue.clone());
            }
            issue.resolved = true;
            issue.resolved_at = Some(Utc::now());
            issue.resolved_by = Some(resolved_by.to_string());
            issue.resolution_note = note;
            issue.clone()
        };

        tracing::info!(issue_id = %id, resolved_by, "data quality issue resolved");

        if let Some(audit) = &self.audit {
            let mut metadata = Map::new();
            metadata.insert(
                "issue_type".to_string(),
                Value::from(resolved.issue_type.as_str()),
            );
            metadata.insert("event_id".to_string(), Value::from(resolved.event_id.clone()));
            if let Some(note) = &resolved.resolution_note {
                metadata.insert("note".to_string(), Value::from(note.clone()));
            }
            let user = UserContext {
                user_id: resolved_by.to_string(),
                ..UserContext::default()
            };
            if let Err(e) = audit
                .log_user_action(
                    user,
                    "resolve_data_quality_issue",
                    Some(&id.to_string()),
                    metadata,
                )
                .await
            {
                tracing::warn!(error = %e, issue_id = %id, "failed to audit issue resolution");
            }
        }

        Ok(resolved)
    }

    // -----------------------------------------------------------------------
    // Metrics
    // -----------------------------------------------------------------------

    pub async fn metrics(&self) -> QualityMetrics {
        let state = self.state.read().await;
        Self::metrics_from(&state)
    }

    pub async fn generate_quality_report(&self) -> QualityReport {
        let state = self.state.read().await;
        let summary = Self::metrics_from(&state);
        build_report(summary, &state.counters.max_severity, Utc::now())
    }

    /// Clears counters. Stored issues are kept.
    pub async fn reset_metrics(&self) {
        self.state.write().await.counters = Counters::default();
    }

    fn metrics_from(state: &MonitorState) -> QualityMetrics {
        let c = &state.counters;
        QualityMetrics {
            total_events_processed: c.total,
            valid_events: c.valid,
            invalid_events: c.total - c.valid,
            total_issues: c.issues_total,
            unresolved_issues: state.issues.iter().filter(|i| !i.resolved).count() as u64,
            issues_by_type: c.by_type.clone(),
            issues_by_severity: c.by_severity.clone(),
            platforms: c.platforms.clone(),
            quality_score: ratio_score(c.valid, c.total),
            completeness_score: dimension_score(
                c.dimension_issues(QualityDimension::Completeness),
                c.total,
            ),
            accuracy_score: dimension_score(
                c.dimension_issues(QualityDimension::Accuracy),
                c.total,
            ),
            consistency_score: dimension_score(
                c.dimension_issues(QualityDimension::Consistency),
                c.total,
            ),
        }
    }
}

#[cfg(test)]
#[path = "monitor_test.rs"]
mod tests;
