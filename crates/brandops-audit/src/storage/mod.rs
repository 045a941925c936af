//! Audit persistence backends.

mod memory;
mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use brandops_core::{AppConfig, AuditFilters, AuditLogEntry, AuditStatistics, AuditStorageKind};
use sqlx::PgPool;

use crate::AuditError;

pub use memory::MemoryAuditStorage;
pub use postgres::PgAuditStorage;

/// Durable store for audit entries.
///
/// Implementations must order query results by timestamp descending (ties by
/// id descending) and honor the filter's normalized limit and offset.
#[async_trait]
pub trait AuditStorage: Send + Sync {
    async fn store(&self, entry: &AuditLogEntry) -> Result<(), AuditError>;

    /// Stores every entry or none of them. Returns the number stored.
    async fn store_batch(&self, entries: &[AuditLogEntry]) -> Result<u64, AuditError>;

    async fn query(&self, filters: &AuditFilters) -> Result<Vec<AuditLogEntry>, AuditError>;

    async fn statistics(&self, filters: &AuditFilters) -> Result<AuditStatistics, AuditError>;

    /// Deletes entries older than `retention_days`; returns rows removed.
    async fn cleanup(&self, retention_days: u32) -> Result<u64, AuditError>;

    async fn health_check(&self) -> Result<(), AuditError>;
}

/// Backend selected by `BRANDOPS_AUDIT_STORAGE`.
#[must_use]
pub fn storage_from_config(config: &AppConfig, pool: &PgPool) -> Arc<dyn AuditStorage> {
    match config.audit_storage {
        AuditStorageKind::Postgres => Arc::new(PgAuditStorage::new(
            pool.clone(),
            Duration::from_millis(config.audit_storage_timeout_ms),
        )),
        AuditStorageKind::Memory => {
            tracing::warn!("audit storage is in-memory; entries are lost on restart");
            Arc::new(MemoryAuditStorage::new())
        }
    }
}
