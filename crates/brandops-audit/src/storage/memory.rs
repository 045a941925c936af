use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use brandops_core::audit::{HourlyBucket, KeyCount, PerformanceAverages, TOP_N};
use brandops_core::{AuditFilters, AuditLogEntry, AuditStatistics};
use chrono::{DateTime, Duration, DurationRound, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::AuditStorage;
use crate::AuditError;

/// In-process audit storage with the same filter and ordering semantics as
/// the Postgres backend. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryAuditStorage {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl MemoryAuditStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn duplicate_error(id: Uuid) -> AuditError {
        AuditError::Unavailable(format!("duplicate audit entry id {id}"))
    }
}

#[async_trait]
impl AuditStorage for MemoryAuditStorage {
    async fn store(&self, entry: &AuditLogEntry) -> Result<(), AuditError> {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(Self::duplicate_error(entry.id));
        }
        entries.push(entry.clone());
        Ok(())
    }

    async fn store_batch(&self, batch: &[AuditLogEntry]) -> Result<u64, AuditError> {
        let mut entries = self.entries.write().await;
        let mut seen: HashSet<Uuid> = entries.iter().map(|e| e.id).collect();
        for entry in batch {
            if !seen.insert(entry.id) {
                return Err(Self::duplicate_error(entry.id));
            }
        }
        entries.extend(batch.iter().cloned());
        Ok(batch.len() as u64)
    }

    async fn query(&self, filters: &AuditFilters) -> Result<Vec<AuditLogEntry>, AuditError> {
        let entries = self.entries.read().await;
        let mut matched: Vec<&AuditLogEntry> =
            entries.iter().filter(|e| filters.matches(e)).collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        let offset = usize::try_from(filters.effective_offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(filters.effective_limit()).unwrap_or(usize::MAX);
        Ok(matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn statistics(&self, filters: &AuditFilters) -> Result<AuditStatistics, AuditError> {
        let entries = self.entries.read().await;
        let matched: Vec<&AuditLogEntry> = entries.iter().filter(|e| filters.matches(e)).collect();
        Ok(compute_statistics(&matched, Utc::now()))
    }

    async fn cleanup(&self, retention_days: u32) -> Result<u64, AuditError> {
        let cutoff = Utc::now() - Duration::days(i64::from(retention_days));
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.timestamp >= cutoff);
        Ok((before - entries.len()) as u64)
    }

    async fn health_check(&self) -> Result<(), AuditError> {
        Ok(())
    }
}

fn compute_statistics(entries: &[&AuditLogEntry], now: DateTime<Utc>) -> AuditStatistics {
    let mut by_type: BTreeMap<String, i64> = BTreeMap::new();
    let mut by_severity: BTreeMap<String, i64> = BTreeMap::new();
    let mut hourly: BTreeMap<DateTime<Utc>, i64> = BTreeMap::new();
    let mut users: HashMap<&str, i64> = HashMap::new();
    let mut services: HashMap<&str, i64> = HashMap::new();

    let mut durations = Vec::new();
    let mut query_counts = Vec::new();
    let mut cache_hits = Vec::new();

    let window_start = now - Duration::hours(24);

    for entry in entries {
        *by_type.entry(entry.event_type.as_str().to_string()).or_default() += 1;
        *by_severity
            .entry(entry.severity.as_str().to_string())
            .or_default() += 1;

        if entry.timestamp >= window_start {
            if let Ok(hour) = entry.timestamp.duration_trunc(Duration::hours(1)) {
                *hourly.entry(hour).or_default() += 1;
            }
        }

        if let Some(user) = &entry.user_context {
            *users.entry(user.user_id.as_str()).or_default() += 1;
        }
        *services
            .entry(entry.system_context.service_id.as_str())
            .or_default() += 1;

        if let Some(perf) = &entry.performance_metrics {
            durations.push(perf.duration_ms);
            if let Some(n) = perf.db_query_count {
                query_counts.push(f64::from(n));
            }
            if let Some(hit) = perf.cache_hit {
                cache_hits.push(if hit { 1.0 } else { 0.0 });
            }
        }
    }

    AuditStatistics {
        total_events: entries.len() as i64,
        events_by_type: by_type,
        events_by_severity: by_severity,
        hourly_events: hourly
            .into_iter()
            .map(|(hour, count)| HourlyBucket { hour, count })
            .collect(),
        top_users: top_n(users),
        top_services: top_n(services),
        performance: PerformanceAverages {
            sample_count: durations.len() as i64,
            avg_duration_ms: mean(&durations),
            avg_db_query_count: mean(&query_counts),
            cache_hit_rate: mean(&cache_hits),
        },
    }
}

fn top_n(counts: HashMap<&str, i64>) -> Vec<KeyCount> {
    let mut ranked: Vec<KeyCount> = counts
        .into_iter()
        .map(|(key, count)| KeyCount {
            key: key.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    ranked.truncate(TOP_N);
    ranked
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
