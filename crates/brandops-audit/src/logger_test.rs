use std::sync::atomic::{AtomicBool, AtomicUsize};

use async_trait::async_trait;
use brandops_core::UserContext;

use super::*;
use crate::builder::capture_system_context;
use crate::storage::MemoryAuditStorage;

/// Memory storage whose batch writes can be switched off.
#[derive(Default)]
struct FlakyStorage {
    inner: MemoryAuditStorage,
    failing: AtomicBool,
    batches: AtomicUsize,
}

impl FlakyStorage {
    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditStorage for FlakyStorage {
    async fn store(&self, entry: &AuditLogEntry) -> Result<(), AuditError> {
        self.inner.store(entry).await
    }

    async fn store_batch(&self, entries: &[AuditLogEntry]) -> Result<u64, AuditError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuditError::Unavailable("storage offline".to_string()));
        }
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.inner.store_batch(entries).await
    }

    async fn query(&self, filters: &AuditFilters) -> Result<Vec<AuditLogEntry>, AuditError> {
        self.inner.query(filters).await
    }

    async fn statistics(&self, filters: &AuditFilters) -> Result<AuditStatistics, AuditError> {
        self.inner.statistics(filters).await
    }

    async fn cleanup(&self, retention_days: u32) -> Result<u64, AuditError> {
        self.inner.cleanup(retention_days).await
    }

    async fn health_check(&self) -> Result<(), AuditError> {
        self.inner.health_check().await
    }
}

fn logger_with(config: AuditLoggerConfig) -> (Arc<AuditLogger>, Arc<FlakyStorage>) {
    let storage = Arc::new(FlakyStorage::default());
    let logger = AuditLogger::new(
        config,
        capture_system_context("brandops-test", "test"),
        storage.clone(),
    );
    (logger, storage)
}

fn config(batch_size: usize) -> AuditLoggerConfig {
    AuditLoggerConfig {
        batch_size,
        ..AuditLoggerConfig::default()
    }
}

#[tokio::test]
async fn full_batch_flushes_before_next_entry() {
    let (logger, storage) = logger_with(config(2));

    for i in 0..3 {
        let entry = logger
            .event(AuditEventType::UserAction, format!("action {i}"))
            .build();
        logger.log(entry).await.expect("log");
    }

    assert_eq!(storage.batches(), 1);
    assert_eq!(storage.inner.len().await, 2);
    assert_eq!(logger.buffered().await, 1);
}

#[tokio::test]
async fn critical_entry_flushes_immediately() {
    let (logger, storage) = logger_with(config(100));

    let entry = logger
        .event(AuditEventType::SystemError, "disk full")
        .severity(AuditSeverity::Critical)
        .build();
    logger.log(entry).await.expect("log");

    assert_eq!(storage.inner.len().await, 1);
    assert_eq!(logger.buffered().await, 0);
}

#[tokio::test]
async fn entries_below_level_are_never_persisted() {
    let (logger, storage) = logger_with(AuditLoggerConfig {
        log_level: AuditSeverity::Warn,
        ..config(1)
    });

    for severity in [AuditSeverity::Debug, AuditSeverity::Info] {
        let entry = logger
            .event(AuditEventType::UserAction, "quiet")
            .severity(severity)
            .build();
        logger.log(entry).await.expect("log");
    }
    logger.flush().await.expect("flush");
    assert!(storage.inner.is_empty().await);

    let entry = logger
        .event(AuditEventType::UserAction, "loud")
        .severity(AuditSeverity::Warn)
        .build();
    logger.log(entry).await.expect("log");
    assert_eq!(storage.inner.len().await, 1);
}

#[tokio::test]
async fn disabled_logger_is_a_no_op() {
    let (logger, storage) = logger_with(AuditLoggerConfig {
        enabled: false,
        ..config(1)
    });
    let entry = logger
        .event(AuditEventType::UserAction, "ignored")
        .severity(AuditSeverity::Critical)
        .build();
    logger.log(entry).await.expect("log");
    assert_eq!(logger.buffered().await, 0);
    assert!(storage.inner.is_empty().await);
}

#[tokio::test]
async fn stored_pii_is_anonymized() {
    let (logger, _storage) = logger_with(config(100));
    let entry = logger
        .event(AuditEventType::UserLogin, "login")
        .user(UserContext {
            user_id: "u-9".to_string(),
            email: Some("morgan@acme.example".to_string()),
            ip_address: Some("203.0.113.77".to_string()),
            ..UserContext::default()
        })
        .build();
    logger.log(entry).await.expect("log");

    let stored = logger
        .query(&AuditFilters::default())
        .await
        .expect("query");
    let user = stored[0].user_context.as_ref().expect("user context");
    let email = user.email.as_deref().expect("email");
    assert_ne!(email, "morgan@acme.example");
    assert!(email.ends_with("@acme.example"));
    assert_eq!(user.ip_address.as_deref(), Some("203.0.xxx.xxx"));
}

#[tokio::test]
async fn failed_flush_requeues_in_order() {
    let (logger, storage) = logger_with(config(100));
    storage.set_failing(true);

    for i in 0..2 {
        let entry = logger
            .event(AuditEventType::UserAction, format!("first {i}"))
            .build();
        logger.log(entry).await.expect("log");
    }
    assert!(logger.flush().await.is_err());
    assert_eq!(logger.buffered().await, 2);

    let entry = logger.event(AuditEventType::UserAction, "later").build();
    logger.log(entry).await.expect("log");

    storage.set_failing(false);
    assert_eq!(logger.flush().await.expect("flush"), 3);

    let all = storage
        .inner
        .query(&AuditFilters::default())
        .await
        .expect("query");
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn critical_flush_failure_surfaces_to_caller() {
    let (logger, storage) = logger_with(config(100));
    storage.set_failing(true);
    let entry = logger
        .event(AuditEventType::SystemError, "boom")
        .severity(AuditSeverity::Critical)
        .build();
    let result = logger.log(entry).await;
    assert!(matches!(result, Err(AuditError::Unavailable(_))));
    assert_eq!(logger.buffered().await, 1);
}

#[tokio::test]
async fn overflow_drops_oldest_entries() {
    let (logger, _storage) = logger_with(AuditLoggerConfig {
        max_buffer_size: 2,
        ..config(10)
    });
    for i in 0..3 {
        let entry = logger
            .event(AuditEventType::UserAction, format!("entry {i}"))
            .build();
        logger.log(entry).await.expect("log");
    }
    assert_eq!(logger.buffered().await, 2);
    assert_eq!(logger.dropped_count(), 1);
}

#[tokio::test]
async fn log_then_query_returns_same_entry() {
    let (logger, _storage) = logger_with(config(100));
    let entry = logger
        .event(AuditEventType::DecisionMade, "auto-respond selected")
        .severity(AuditSeverity::Warn)
        .build();
    let expected = entry.clone();
    logger.log(entry).await.expect("log");

    let found = logger
        .query(&AuditFilters {
            limit: Some(1),
            ..AuditFilters::default()
        })
        .await
        .expect("query");
    assert_eq!(found.len(), 1);
    let got = &found[0];
    assert_eq!(got.id, expected.id);
    assert_eq!(got.event_type, expected.event_type);
    assert_eq!(got.severity, expected.severity);
    assert_eq!(got.message, expected.message);
    assert_eq!(
        got.timestamp.timestamp_millis(),
        expected.timestamp.timestamp_millis()
    );
}

#[tokio::test(start_paused = true)]
async fn periodic_task_flushes_on_interval() {
    let (logger, storage) = logger_with(AuditLoggerConfig {
        flush_interval: Duration::from_millis(50),
        ..config(100)
    });
    logger.start();

    let entry = logger.event(AuditEventType::UserAction, "tick").build();
    logger.log(entry).await.expect("log");
    assert!(storage.inner.is_empty().await);

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(storage.inner.len().await, 1);
}

#[tokio::test]
async fn cleanup_records_its_own_entry() {
    let (logger, storage) = logger_with(config(100));
    let removed = logger.cleanup(30).await.expect("cleanup");
    assert_eq!(removed, 0);

    logger.flush().await.expect("flush");
    let entries = storage
        .inner
        .query(&AuditFilters {
            event_types: vec![AuditEventType::AuditCleanup],
            ..AuditFilters::default()
        })
        .await
        .expect("query");
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn shutdown_flushes_remaining_entries() {
    let (logger, storage) = logger_with(config(100));
    logger.start();
    let entry = logger.event(AuditEventType::SystemShutdown, "bye").build();
    logger.log(entry).await.expect("log");

    assert_eq!(logger.shutdown().await.expect("shutdown"), 1);
    assert_eq!(storage.inner.len().await, 1);
}
