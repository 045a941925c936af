use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use brandops_core::{AuditFilters, AuditLogEntry, AuditStatistics};
use brandops_db::DbError;
use sqlx::PgPool;

use super::AuditStorage;
use crate::AuditError;

/// Postgres-backed audit storage. Every call is bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct PgAuditStorage {
    pool: PgPool,
    timeout: Duration,
}

impl PgAuditStorage {
    #[must_use]
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, AuditError>
    where
        F: Future<Output = Result<T, DbError>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(AuditError::from),
            Err(_) => Err(AuditError::Timeout {
                operation,
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

#[async_trait]
impl AuditStorage for PgAuditStorage {
    async fn store(&self, entry: &AuditLogEntry) -> Result<(), AuditError> {
        self.bounded("store", brandops_db::insert_audit_log(&self.pool, entry))
            .await
    }

    async fn store_batch(&self, entries: &[AuditLogEntry]) -> Result<u64, AuditError> {
        self.bounded(
            "store_batch",
            brandops_db::insert_audit_logs(&self.pool, entries),
        )
        .await
    }

    async fn query(&self, filters: &AuditFilters) -> Result<Vec<AuditLogEntry>, AuditError> {
        self.bounded("query", brandops_db::query_audit_logs(&self.pool, filters))
            .await
    }

    async fn statistics(&self, filters: &AuditFilters) -> Result<AuditStatistics, AuditError> {
        self.bounded(
            "statistics",
            brandops_db::audit_statistics(&self.pool, filters),
        )
        .await
    }

    async fn cleanup(&self, retention_days: u32) -> Result<u64, AuditError> {
        self.bounded(
            "cleanup",
            brandops_db::delete_audit_logs_older_than(&self.pool, retention_days),
        )
        .await
    }

    async fn health_check(&self) -> Result<(), AuditError> {
        self.bounded("health_check", brandops_db::health_check(&self.pool))
            .await
    }
}
