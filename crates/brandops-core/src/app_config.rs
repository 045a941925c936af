use std::net::SocketAddr;

use crate::audit::AuditSeverity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which backend receives flushed audit entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStorageKind {
    Postgres,
    Memory,
}

impl std::fmt::Display for AuditStorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditStorageKind::Postgres => write!(f, "postgres"),
            AuditStorageKind::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub service_id: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub audit_enabled: bool,
    pub audit_storage: AuditStorageKind,
    pub audit_log_level: AuditSeverity,
    pub audit_batch_size: usize,
    pub audit_flush_interval_ms: u64,
    pub audit_max_buffer_size: usize,
    pub audit_anonymize: bool,
    pub audit_retention_days: u32,
    pub audit_storage_timeout_ms: u64,
    pub context_ttl_ms: u64,
    pub context_max_size: usize,
    pub context_refresh_interval_ms: u64,
    pub context_fallback_to_cache: bool,
    pub context_escalation_threshold: f64,
    pub context_load_timeout_ms: u64,
    pub compliance_min_score: f64,
    pub retention_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("service_id", &self.service_id)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("audit_enabled", &self.audit_enabled)
            .field("audit_storage", &self.audit_storage)
            .field("audit_log_level", &self.audit_log_level)
            .field("audit_batch_size", &self.audit_batch_size)
            .field("audit_flush_interval_ms", &self.audit_flush_interval_ms)
            .field("audit_max_buffer_size", &self.audit_max_buffer_size)
            .field("audit_anonymize", &self.audit_anonymize)
            .field("audit_retention_days", &self.audit_retention_days)
            .field("audit_storage_timeout_ms", &self.audit_storage_timeout_ms)
            .field("context_ttl_ms", &self.context_ttl_ms)
            .field("context_max_size", &self.context_max_size)
            .field(
                "context_refresh_interval_ms",
                &self.context_refresh_interval_ms,
            )
            .field("context_fallback_to_cache", &self.context_fallback_to_cache)
            .field(
                "context_escalation_threshold",
                &self.context_escalation_threshold,
            )
            .field("context_load_timeout_ms", &self.context_load_timeout_ms)
            .field("compliance_min_score", &self.compliance_min_score)
            .field("retention_cron", &self.retention_cron)
            .finish()
    }
}
