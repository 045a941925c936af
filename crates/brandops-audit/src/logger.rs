use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use brandops_core::{
    AppConfig, AuditEventType, AuditFilters, AuditLogEntry, AuditSeverity, AuditStatistics,
    SystemContext,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::anonymize::anonymize_entry;
use crate::builder::AuditEventBuilder;
use crate::storage::AuditStorage;
use crate::AuditError;

#[derive(Debug, Clone)]
pub struct AuditLoggerConfig {
    pub enabled: bool,
    /// Entries below this severity are dropped.
    pub log_level: AuditSeverity,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub max_buffer_size: usize,
    pub anonymize: bool,
    pub retention_days: u32,
}

impl Default for AuditLoggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: AuditSeverity::Info,
            batch_size: 100,
            flush_interval: Duration::from_millis(5000),
            max_buffer_size: 10_000,
            anonymize: true,
            retention_days: 365,
        }
    }
}

impl AuditLoggerConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            enabled: config.audit_enabled,
            log_level: config.audit_log_level,
            batch_size: config.audit_batch_size.max(1),
            flush_interval: Duration::from_millis(config.audit_flush_interval_ms.max(1)),
            max_buffer_size: config.audit_max_buffer_size.max(config.audit_batch_size),
            anonymize: config.audit_anonymize,
            retention_days: config.audit_retention_days,
        }
    }
}

/// Buffers audit entries and writes them to storage in batches.
///
/// Appends and flushes are serialized: the buffer has its own lock and a
/// second lock ensures only one flush talks to storage at a time.
pub struct AuditLogger {
    config: AuditLoggerConfig,
    system_context: SystemContext,
    storage: Arc<dyn AuditStorage>,
    buffer: Mutex<Vec<AuditLogEntry>>,
    flush_lock: Mutex<()>,
    flush_task: std::sync::Mutex<Option<JoinHandle<()>>>,
    dropped: AtomicU64,
}

impl AuditLogger {
    #[must_use]
    pub fn new(
        config: AuditLoggerConfig,
        system_context: SystemContext,
        storage: Arc<dyn AuditStorage>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            system_context,
            storage,
            buffer: Mutex::new(Vec::new()),
            flush_lock: Mutex::new(()),
            flush_task: std::sync::Mutex::new(None),
            dropped: AtomicU64::new(0),
        })
    }

    /// Spawns the periodic flush task. Must be called inside a tokio runtime.
    /// Calling it again replaces the previous task.
    pub fn start(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.config.flush_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(logger) = weak.upgrade() else {
                    break;
                };
                if let Err(e) = logger.flush().await {
                    tracing::warn!(error = %e, "periodic audit flush failed");
                }
            }
        });

        if let Ok(mut slot) = self.flush_task.lock() {
            if let Some(previous) = slot.replace(handle) {
                previous.abort();
            }
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuditLoggerConfig {
        &self.config
    }

    #[must_use]
    pub fn system_context(&self) -> &SystemContext {
        &self.system_context
    }

    /// Starts a new entry stamped with this process's system context.
    pub fn event(&self, event_type: AuditEventType, message: impl Into<String>) -> AuditEventBuilder {
        AuditEventBuilder::new(event_type, message, self.system_context.clone())
    }

    /// Entries dropped because the buffer overflowed.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub async fn buffered(&self) -> usize {
        self.buffer.lock().await.len()
    }

    /// Buffers `entry`, flushing when the batch is full or the entry is
    /// critical. Disabled loggers and entries below the configured level are
    /// accepted silently.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when a triggered flush fails. The entry stays
    /// buffered for the next flush in that case.
    pub async fn log(&self, mut entry: AuditLogEntry) -> Result<(), AuditError> {
        if !self.config.enabled {
            return Ok(());
        }
        if entry.severity < self.config.log_level {
            tracing::trace!(
                event_type = %entry.event_type,
                severity = %entry.severity,
                "audit entry below configured level"
            );
            return Ok(());
        }
        if self.config.anonymize {
            anonymize_entry(&mut entry);
        }

        let critical = entry.severity == AuditSeverity::Critical;
        let should_flush = {
            let mut buffer = self.buffer.lock().await;
            buffer.push(entry);
            self.enforce_capacity(&mut buffer);
            critical || buffer.len() >= self.config.batch_size
        };

        if should_flush {
            self.flush().await?;
        }
        Ok(())
    }

    /// Writes all buffered entries as one all-or-nothing batch.
    ///
    /// Returns the number of entries written.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] if storage rejects the batch; the batch is put
    /// back at the front of the buffer.
    pub async fn flush(&self) -> Result<usize, AuditError> {
        let _guard = self.flush_lock.lock().await;

        let batch = {
            let mut buffer = self.buffer.lock().await;
            std::mem::take(&mut *buffer)
        };
        if batch.is_empty() {
            return Ok(0);
        }

        match self.storage.store_batch(&batch).await {
            Ok(_) => {
                tracing::debug!(count = batch.len(), "flushed audit entries");
                Ok(batch.len())
            }
            Err(e) => {
                tracing::warn!(count = batch.len(), error = %e, "audit flush failed; re-queueing");
                let mut buffer = self.buffer.lock().await;
                let newer = std::mem::take(&mut *buffer);
                *buffer = batch;
                buffer.extend(newer);
                self.enforce_capacity(&mut buffer);
                Err(e)
            }
        }
    }

    /// Flushes, then queries storage so freshly logged entries are visible.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] if the storage query fails. A failed flush is
    /// logged and does not stop the query.
    pub async fn query(&self, filters: &AuditFilters) -> Result<Vec<AuditLogEntry>, AuditError> {
        if let Err(e) = self.flush().await {
            tracing::warn!(error = %e, "flush before audit query failed");
        }
        self.storage.query(filters).await
    }

    /// # Errors
    ///
    /// Returns [`AuditError`] if the storage statistics query fails.
    pub async fn statistics(&self, filters: &AuditFilters) -> Result<AuditStatistics, AuditError> {
        if let Err(e) = self.flush().await {
            tracing::warn!(error = %e, "flush before audit statistics failed");
        }
        self.storage.statistics(filters).await
    }

    /// Deletes entries older than `retention_days` and records the purge.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] if the delete fails.
    pub async fn cleanup(&self, retention_days: u32) -> Result<u64, AuditError> {
        let removed = self.storage.cleanup(retention_days).await?;
        tracing::info!(removed, retention_days, "audit retention cleanup complete");

        let entry = self
            .event(
                AuditEventType::AuditCleanup,
                format!("removed {removed} audit entries older than {retention_days} days"),
            )
            .metadata("rows_removed", removed)
            .metadata("retention_days", retention_days)
            .tags(["audit", "retention"])
            .build();
        if let Err(e) = self.log(entry).await {
            tracing::warn!(error = %e, "failed to record audit cleanup");
        }
        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns [`AuditError`] if the storage backend is unreachable.
    pub async fn health_check(&self) -> Result<(), AuditError> {
        self.storage.health_check().await
    }

    /// Stops the periodic flush task and flushes what is left.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] if the final flush fails.
    pub async fn shutdown(&self) -> Result<usize, AuditError> {
        let handle = self.flush_task.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            handle.abort();
        }
        self.flush().await
    }

    fn enforce_capacity(&self, buffer: &mut Vec<AuditLogEntry>) {
        let max = self.config.max_buffer_size.max(1);
        if buffer.len() > max {
            let overflow = buffer.len() - max;
            buffer.drain(..overflow);
            self.dropped.fetch_add(overflow as u64, Ordering::Relaxed);
            tracing::warn!(overflow, max, "audit buffer full; dropped oldest entries");
        }
    }
}

impl Drop for AuditLogger {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.flush_task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
#[path = "logger_test.rs"]
mod tests;
