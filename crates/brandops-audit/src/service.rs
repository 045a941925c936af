use std::sync::Arc;

use brandops_core::{
    AppConfig, AuditEventType, AuditFilters, AuditLogEntry, AuditSeverity, AuditStatistics,
    DecisionContext, DecisionOutput, DecisionType, ErrorDetails, PerformanceMetrics, UserContext,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::builder::{capture_system_context, AuditEventBuilder};
use crate::logger::{AuditLogger, AuditLoggerConfig};
use crate::storage::AuditStorage;
use crate::AuditError;

/// Semantic audit API shared by every subsystem.
///
/// Each `log_*` method returns the id of the entry it built. Entries filtered
/// out by the configured level still get an id.
#[derive(Clone)]
pub struct AuditService {
    logger: Arc<AuditLogger>,
}

impl AuditService {
    #[must_use]
    pub fn new(logger: Arc<AuditLogger>) -> Self {
        Self { logger }
    }

    /// Builds the logger from application config and starts its flush task.
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn from_app_config(config: &AppConfig, storage: Arc<dyn AuditStorage>) -> Self {
        let logger = AuditLogger::new(
            AuditLoggerConfig::from_app_config(config),
            capture_system_context(&config.service_id, &config.env.to_string()),
            storage,
        );
        logger.start();
        Self { logger }
    }

    #[must_use]
    pub fn logger(&self) -> &Arc<AuditLogger> {
        &self.logger
    }

    pub fn event(&self, event_type: AuditEventType, message: impl Into<String>) -> AuditEventBuilder {
        self.logger.event(event_type, message)
    }

    /// # Errors
    ///
    /// Returns [`AuditError`] if a flush triggered by this entry fails.
    pub async fn log(&self, entry: AuditLogEntry) -> Result<Uuid, AuditError> {
        let id = entry.id;
        self.logger.log(entry).await?;
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Decisions and actions
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`AuditError`] if a triggered flush fails.
    pub async fn log_decision_made(
        &self,
        decision: &DecisionOutput,
        user: Option<UserContext>,
    ) -> Result<Uuid, AuditError> {
        let mut builder = self
            .event(
                AuditEventType::DecisionMade,
                format!(
                    "{} decision for event {}",
                    decision.decision_type, decision.event_id
                ),
            )
            .decision(DecisionContext {
                decision_id: decision.decision_id,
                event_id: Some(decision.event_id.clone()),
                brand_id: Some(decision.brand_id),
                persona_id: decision.persona_id,
                decision_type: decision.decision_type.as_str().to_string(),
                confidence: Some(decision.confidence),
                reasoning: decision.reasoning.clone(),
                action_taken: None,
            })
            .performance(PerformanceMetrics {
                duration_ms: millis_f64(decision.processing_time_ms),
                ..PerformanceMetrics::default()
            })
            .metadata("brand_id", decision.brand_id.to_string())
            .metadata(
                "has_suggested_response",
                decision.suggested_response.is_some(),
            )
            .tags(["decision", decision.decision_type.as_str()]);

        if decision.decision_type == DecisionType::Escalate {
            builder = builder.severity(AuditSeverity::Warn);
        }
        if let Some(user) = user {
            builder = builder.user(user);
        }
        self.log(builder.build()).await
    }

    /// # Errors
    ///
    /// Returns [`AuditError`] if a triggered flush fails.
    pub async fn log_decision_overridden(
        &self,
        decision_id: Uuid,
        original: DecisionType,
        replacement: DecisionType,
        user: UserContext,
        reason: &str,
    ) -> Result<Uuid, AuditError> {
        let entry = self
            .event(
                AuditEventType::DecisionOverridden,
                format!("decision overridden from {original} to {replacement}"),
            )
            .severity(AuditSeverity::Warn)
            .description(reason)
            .user(user)
            .decision(DecisionContext {
                decision_id,
                decision_type: replacement.as_str().to_string(),
                reasoning: vec![reason.to_string()],
                ..DecisionContext::default()
            })
            .metadata("original_decision_type", original.as_str())
            .tags(["decision", "override"])
            .build();
        self.log(entry).await
    }

    /// # Errors
    ///
    /// Returns [`AuditError`] if a triggered flush fails.
    pub async fn log_action_executed(
        &self,
        decision_id: Uuid,
        action: &str,
        duration_ms: f64,
        metadata: Map<String, Value>,
    ) -> Result<Uuid, AuditError> {
        let entry = self
            .event(AuditEventType::ActionExecuted, format!("action {action} executed"))
            .decision(DecisionContext {
                decision_id,
                decision_type: "action".to_string(),
                action_taken: Some(action.to_string()),
                ..DecisionContext::default()
            })
            .duration_ms(duration_ms)
            .metadata_map(metadata)
            .tags(["action"])
            .build();
        self.log(entry).await
    }

    /// # Errors
    ///
    /// Returns [`AuditError`] if a triggered flush fails.
    pub async fn log_action_failed(
        &self,
        decision_id: Uuid,
        action: &str,
        error: ErrorDetails,
    ) -> Result<Uuid, AuditError> {
        let entry = self
            .event(
                AuditEventType::ActionFailed,
                format!("action {action} failed: {}", error.message),
            )
            .severity(AuditSeverity::Error)
            .decision(DecisionContext {
                decision_id,
                decision_type: "action".to_string(),
                action_taken: Some(action.to_string()),
                ..DecisionContext::default()
            })
            .error(error)
            .tags(["action", "failure"])
            .build();
        self.log(entry).await
    }

    /// # Errors
    ///
    /// Returns [`AuditError`] if a triggered flush fails.
    pub async fn log_user_action(
        &self,
        user: UserContext,
        action: &str,
        resource: Option<&str>,
        metadata: Map<String, Value>,
    ) -> Result<Uuid, AuditError> {
        let message = match resource {
            Some(resource) => format!("user {} performed {action} on {resource}", user.user_id),
            None => format!("user {} performed {action}", user.user_id),
        };
        let entry = self
            .event(AuditEventType::UserAction, message)
            .user(user)
            .metadata_map(metadata)
            .metadata("action", action)
            .tags(["user"])
            .build();
        self.log(entry).await
    }

    // -----------------------------------------------------------------------
    // Brand context, matching, compliance, quality
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`AuditError`] if a triggered flush fails.
    pub async fn log_brand_context_loaded(
        &self,
        brand_id: Uuid,
        duration_ms: f64,
        cache_hit: bool,
        persona_count: usize,
    ) -> Result<Uuid, AuditError> {
        let entry = self
            .event(
                AuditEventType::BrandContextLoaded,
                format!("brand context loaded for {brand_id}"),
            )
            .performance(PerformanceMetrics {
                duration_ms,
                cache_hit: Some(cache_hit),
                ..PerformanceMetrics::default()
            })
            .metadata("brand_id", brand_id.to_string())
            .metadata("persona_count", persona_count)
            .tags(["brand_context"])
            .build();
        self.log(entry).await
    }

    /// # Errors
    ///
    /// Returns [`AuditError`] if a triggered flush fails.
    pub async fn log_brand_context_failed(
        &self,
        brand_id: Uuid,
        error: &str,
        served_stale: bool,
    ) -> Result<Uuid, AuditError> {
        let entry = self
            .event(
                AuditEventType::BrandContextFailed,
                format!("brand context load failed for {brand_id}"),
            )
            .severity(if served_stale {
                AuditSeverity::Warn
            } else {
                AuditSeverity::Error
            })
            .error(ErrorDetails {
                code: "BRAND_CONTEXT_LOAD_FAILED".to_string(),
                message: error.to_string(),
                recoverable: served_stale,
                stack_trace: None,
            })
            .metadata("brand_id", brand_id.to_string())
            .metadata("served_stale", served_stale)
            .tags(["brand_context", "failure"])
            .build();
        self.log(entry).await
    }

    /// # Errors
    ///
    /// Returns [`AuditError`] if the immediate critical flush fails.
    pub async fn log_brand_context_escalation(
        &self,
        failure_ratio: f64,
        total_attempts: u64,
        threshold: f64,
    ) -> Result<Uuid, AuditError> {
        let entry = self
            .event(
                AuditEventType::BrandContextEscalation,
                format!(
                    "brand context failure ratio {:.1}% exceeds {:.1}% over {total_attempts} loads",
                    failure_ratio * 100.0,
                    threshold * 100.0
                ),
            )
            .severity(AuditSeverity::Critical)
            .metadata("failure_ratio", failure_ratio)
            .metadata("total_attempts", total_attempts)
            .metadata("threshold", threshold)
            .tags(["brand_context", "escalation"])
            .build();
        self.log(entry).await
    }

    /// # Errors
    ///
    /// Returns [`AuditError`] if a triggered flush fails.
    pub async fn log_persona_matched(
        &self,
        event_id: &str,
        brand_id: Uuid,
        persona_id: Option<Uuid>,
        confidence: f64,
        confidence_level: &str,
    ) -> Result<Uuid, AuditError> {
        let message = match persona_id {
            Some(id) => format!("event {event_id} matched persona {id}"),
            None => format!("event {event_id} matched no persona"),
        };
        let mut builder = self
            .event(AuditEventType::PersonaMatched, message)
            .metadata("event_id", event_id)
            .metadata("brand_id", brand_id.to_string())
            .metadata("confidence", confidence)
            .metadata("confidence_level", confidence_level)
            .tags(["persona"]);
        if let Some(id) = persona_id {
            builder = builder.metadata("persona_id", id.to_string());
        }
        self.log(builder.build()).await
    }

    /// # Errors
    ///
    /// Returns [`AuditError`] if a triggered flush fails.
    pub async fn log_compliance_check(
        &self,
        event_id: &str,
        brand_id: Uuid,
        is_compliant: bool,
        overall_score: f64,
        violation_types: &[&str],
    ) -> Result<Uuid, AuditError> {
        let entry = self
            .event(
                AuditEventType::ComplianceCheck,
                format!(
                    "compliance check for event {event_id}: {}",
                    if is_compliant { "passed" } else { "failed" }
                ),
            )
            .severity(if is_compliant {
                AuditSeverity::Info
            } else {
                AuditSeverity::Warn
            })
            .metadata("event_id", event_id)
            .metadata("brand_id", brand_id.to_string())
            .metadata("overall_score", overall_score)
            .metadata("violation_count", violation_types.len())
            .metadata("violation_types", violation_types.to_vec())
            .tags(["compliance"])
            .build();
        self.log(entry).await
    }

    /// Records one failed quality rule for an event.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] if a triggered flush fails.
    pub async fn log_data_quality_check(
        &self,
        event_id: &str,
        issue_id: Uuid,
        issue_type: &str,
        severity: AuditSeverity,
        message: &str,
    ) -> Result<Uuid, AuditError> {
        let entry = self
            .event(
                AuditEventType::DataQualityCheck,
                format!("data quality check failed for event {event_id}: {message}"),
            )
            .severity(severity)
            .metadata("event_id", event_id)
            .metadata("issue_id", issue_id.to_string())
            .metadata("issue_type", issue_type)
            .metadata("passed", false)
            .tags(["data_quality", issue_type])
            .build();
        self.log(entry).await
    }

    // -----------------------------------------------------------------------
    // System
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`AuditError`] if a triggered flush fails.
    pub async fn log_system_event(
        &self,
        event_type: AuditEventType,
        message: &str,
        severity: AuditSeverity,
        metadata: Map<String, Value>,
    ) -> Result<Uuid, AuditError> {
        let entry = self
            .event(event_type, message)
            .severity(severity)
            .metadata_map(metadata)
            .tags(["system"])
            .build();
        self.log(entry).await
    }

    /// # Errors
    ///
    /// Returns [`AuditError`] if a triggered flush fails.
    pub async fn log_error(
        &self,
        code: &str,
        message: &str,
        recoverable: bool,
        metadata: Map<String, Value>,
    ) -> Result<Uuid, AuditError> {
        let entry = self
            .event(AuditEventType::SystemError, message)
            .severity(if recoverable {
                AuditSeverity::Error
            } else {
                AuditSeverity::Critical
            })
            .error(ErrorDetails {
                code: code.to_string(),
                message: message.to_string(),
                recoverable,
                stack_trace: None,
            })
            .metadata_map(metadata)
            .tags(["error"])
            .build();
        self.log(entry).await
    }

    // -----------------------------------------------------------------------
    // Query and lifecycle
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`AuditError`] if the storage query fails.
    pub async fn query(&self, filters: &AuditFilters) -> Result<Vec<AuditLogEntry>, AuditError> {
        self.logger.query(filters).await
    }

    /// # Errors
    ///
    /// Returns [`AuditError`] if the storage query fails.
    pub async fn get_statistics(
        &self,
        filters: &AuditFilters,
    ) -> Result<AuditStatistics, AuditError> {
        self.logger.statistics(filters).await
    }

    /// Purges entries older than `retention_days`, or the configured
    /// retention when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] if the delete fails.
    pub async fn cleanup(&self, retention_days: Option<u32>) -> Result<u64, AuditError> {
        let days = retention_days.unwrap_or(self.logger.config().retention_days);
        self.logger.cleanup(days).await
    }

    /// # Errors
    ///
    /// Returns [`AuditError`] if storage rejects the batch.
    pub async fn flush(&self) -> Result<usize, AuditError> {
        self.logger.flush().await
    }

    /// # Errors
    ///
    /// Returns [`AuditError`] if the storage backend is unreachable.
    pub async fn health_check(&self) -> Result<(), AuditError> {
        self.logger.health_check().await
    }

    /// # Errors
    ///
    /// Returns [`AuditError`] if the final flush fails.
    pub async fn shutdown(&self) -> Result<usize, AuditError> {
        self.logger.shutdown().await
    }
}

#[allow(clippy::cast_precision_loss)]
fn millis_f64(ms: u64) -> f64 {
    ms as f64
}
