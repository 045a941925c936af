//! Database operations for the `audit_logs` table.
//!
//! Indexed fields are stored as scalar columns; nested contexts are JSONB.

use brandops_core::audit::{HourlyBucket, KeyCount, PerformanceAverages, TOP_N};
use brandops_core::{AuditFilters, AuditLogEntry, AuditStatistics};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::DbError;

macro_rules! audit_columns {
    () => {
        "id, timestamp, event_type, severity, message, description, user_context, \
         system_context, decision_context, performance_metrics, error_details, metadata, \
         tags, retention_policy, compliance_flags, parent_event_id, related_event_ids"
    };
}

// Binds $1..$8 in the order produced by `FilterBinds::bind`.
macro_rules! audit_filter_clause {
    () => {
        "($1::TEXT[] IS NULL OR event_type = ANY($1)) \
         AND ($2::TEXT[] IS NULL OR severity = ANY($2)) \
         AND ($3::TEXT IS NULL OR user_id = $3) \
         AND ($4::TEXT IS NULL OR service_id = $4) \
         AND ($5::timestamptz IS NULL OR timestamp >= $5) \
         AND ($6::timestamptz IS NULL OR timestamp <= $6) \
         AND ($7::TEXT[] IS NULL OR tags && $7) \
         AND ($8::TEXT IS NULL \
              OR message ILIKE '%' || $8 || '%' \
              OR description ILIKE '%' || $8 || '%')"
    };
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `audit_logs` table, before JSONB decoding.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditLogRow {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub severity: String,
    pub message: String,
    pub description: Option<String>,
    pub user_context: Option<Value>,
    pub system_context: Value,
    pub decision_context: Option<Value>,
    pub performance_metrics: Option<Value>,
    pub error_details: Option<Value>,
    pub metadata: Option<Value>,
    pub tags: Option<Vec<String>>,
    pub retention_policy: Value,
    pub compliance_flags: Option<Value>,
    pub parent_event_id: Option<Uuid>,
    pub related_event_ids: Option<Vec<Uuid>>,
}

impl TryFrom<AuditLogRow> for AuditLogEntry {
    type Error = DbError;

    fn try_from(row: AuditLogRow) -> Result<Self, Self::Error> {
        let metadata = match row.metadata {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(other) => {
                return Err(DbError::decode(
                    "metadata",
                    format!("expected object, got {other}"),
                ))
            }
        };

        Ok(AuditLogEntry {
            id: row.id,
            timestamp: row.timestamp,
            event_type: row
                .event_type
                .parse()
                .map_err(|e| DbError::decode("event_type", e))?,
            severity: row
                .severity
                .parse()
                .map_err(|e| DbError::decode("severity", e))?,
            message: row.message,
            description: row.description,
            user_context: decode_optional("user_context", row.user_context)?,
            system_context: decode_json("system_context", row.system_context)?,
            decision_context: decode_optional("decision_context", row.decision_context)?,
            performance_metrics: decode_optional("performance_metrics", row.performance_metrics)?,
            error_details: decode_optional("error_details", row.error_details)?,
            metadata,
            tags: row.tags,
            retention_policy: decode_json("retention_policy", row.retention_policy)?,
            compliance_flags: decode_optional("compliance_flags", row.compliance_flags)?,
            parent_event_id: row.parent_event_id,
            related_event_ids: row.related_event_ids,
        })
    }
}

fn decode_json<T: DeserializeOwned>(column: &'static str, value: Value) -> Result<T, DbError> {
    serde_json::from_value(value).map_err(|e| DbError::decode(column, e))
}

fn decode_optional<T: DeserializeOwned>(
    column: &'static str,
    value: Option<Value>,
) -> Result<Option<T>, DbError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => decode_json(column, v).map(Some),
    }
}

/// Column values for one insert, flattened out of an [`AuditLogEntry`].
struct AuditLogInsert {
    id: Uuid,
    timestamp: DateTime<Utc>,
    event_type: &'static str,
    severity: &'static str,
    message: String,
    description: Option<String>,
    user_id: Option<String>,
    service_id: String,
    decision_id: Option<Uuid>,
    correlation_id: Option<String>,
    duration_ms: Option<f64>,
    db_query_count: Option<i32>,
    cache_hit: Option<bool>,
    user_context: Option<Value>,
    system_context: Value,
    decision_context: Option<Value>,
    performance_metrics: Option<Value>,
    error_details: Option<Value>,
    metadata: Option<Value>,
    tags: Option<Vec<String>>,
    retention_policy: Value,
    compliance_flags: Option<Value>,
    parent_event_id: Option<Uuid>,
    related_event_ids: Option<Vec<Uuid>>,
}

impl AuditLogInsert {
    fn from_entry(entry: &AuditLogEntry) -> Result<Self, DbError> {
        let to_json = |v: Option<Value>| v.filter(|v| !v.is_null());
        let perf = entry.performance_metrics.as_ref();

        Ok(Self {
            id: entry.id,
            timestamp: entry.timestamp,
            event_type: entry.event_type.as_str(),
            severity: entry.severity.as_str(),
            message: entry.message.clone(),
            description: entry.description.clone(),
            user_id: entry.user_context.as_ref().map(|u| u.user_id.clone()),
            service_id: entry.system_context.service_id.clone(),
            decision_id: entry.decision_context.as_ref().map(|d| d.decision_id),
            correlation_id: entry.system_context.correlation_id.clone(),
            duration_ms: perf.map(|p| p.duration_ms),
            db_query_count: perf
                .and_then(|p| p.db_query_count)
                .map(|n| i32::try_from(n).unwrap_or(i32::MAX)),
            cache_hit: perf.and_then(|p| p.cache_hit),
            user_context: to_json(
                entry
                    .user_context
                    .as_ref()
                    .map(serde_json::to_value)
                    .transpose()?,
            ),
            system_context: serde_json::to_value(&entry.system_context)?,
            decision_context: to_json(
                entry
                    .decision_context
                    .as_ref()
                    .map(serde_json::to_value)
                    .transpose()?,
            ),
            performance_metrics: to_json(perf.map(serde_json::to_value).transpose()?),
            error_details: to_json(
                entry
                    .error_details
                    .as_ref()
                    .map(serde_json::to_value)
                    .transpose()?,
            ),
            metadata: entry.metadata.clone().map(Value::Object),
            tags: entry.tags.clone(),
            retention_policy: serde_json::to_value(&entry.retention_policy)?,
            compliance_flags: to_json(
                entry
                    .compliance_flags
                    .as_ref()
                    .map(serde_json::to_value)
                    .transpose()?,
            ),
            parent_event_id: entry.parent_event_id,
            related_event_ids: entry.related_event_ids.clone(),
        })
    }
}

/// Owned bind values for [`audit_filter_clause!`].
struct FilterBinds {
    event_types: Option<Vec<String>>,
    severities: Option<Vec<String>>,
    user_id: Option<String>,
    service_id: Option<String>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    tags: Option<Vec<String>>,
    search: Option<String>,
}

impl FilterBinds {
    fn new(filters: &AuditFilters) -> Self {
        let non_empty = |v: Vec<String>| if v.is_empty() { None } else { Some(v) };
        Self {
            event_types: non_empty(
                filters
                    .event_types
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect(),
            ),
            severities: non_empty(
                filters
                    .severities
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect(),
            ),
            user_id: filters.user_id.clone(),
            service_id: filters.service_id.clone(),
            start_time: filters.start_time,
            end_time: filters.end_time,
            tags: non_empty(filters.tags.clone()),
            search: filters.search_needle().map(escape_like),
        }
    }

    fn bind<'q, O>(
        &self,
        query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        query
            .bind(self.event_types.clone())
            .bind(self.severities.clone())
            .bind(self.user_id.clone())
            .bind(self.service_id.clone())
            .bind(self.start_time)
            .bind(self.end_time)
            .bind(self.tags.clone())
            .bind(self.search.clone())
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[derive(Debug, sqlx::FromRow)]
struct KeyCountRow {
    key: String,
    count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct HourlyRow {
    hour: DateTime<Utc>,
    count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct PerformanceRow {
    sample_count: i64,
    avg_duration_ms: Option<f64>,
    avg_db_query_count: Option<f64>,
    cache_hit_rate: Option<f64>,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

async fn execute_insert<'e, E>(executor: E, row: &AuditLogInsert) -> Result<(), DbError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        "INSERT INTO audit_logs ( \
             id, timestamp, event_type, severity, message, description, \
             user_id, service_id, decision_id, correlation_id, \
             duration_ms, db_query_count, cache_hit, \
             user_context, system_context, decision_context, performance_metrics, \
             error_details, metadata, tags, retention_policy, compliance_flags, \
             parent_event_id, related_event_ids \
         ) VALUES ( \
             $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, \
             $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24 \
         )",
    )
    .bind(row.id)
    .bind(row.timestamp)
    .bind(row.event_type)
    .bind(row.severity)
    .bind(&row.message)
    .bind(row.description.as_deref())
    .bind(row.user_id.as_deref())
    .bind(&row.service_id)
    .bind(row.decision_id)
    .bind(row.correlation_id.as_deref())
    .bind(row.duration_ms)
    .bind(row.db_query_count)
    .bind(row.cache_hit)
    .bind(&row.user_context)
    .bind(&row.system_context)
    .bind(&row.decision_context)
    .bind(&row.performance_metrics)
    .bind(&row.error_details)
    .bind(&row.metadata)
    .bind(&row.tags)
    .bind(&row.retention_policy)
    .bind(&row.compliance_flags)
    .bind(row.parent_event_id)
    .bind(&row.related_event_ids)
    .execute(executor)
    .await?;
    Ok(())
}

/// Inserts one audit entry.
///
/// # Errors
///
/// Returns [`DbError::Encode`] if a nested context cannot be serialized, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn insert_audit_log(pool: &PgPool, entry: &AuditLogEntry) -> Result<(), DbError> {
    let row = AuditLogInsert::from_entry(entry)?;
    execute_insert(pool, &row).await
}

/// Inserts a batch of audit entries in a single transaction.
///
/// Either every entry is stored or none is. Returns the number inserted.
///
/// # Errors
///
/// Returns [`DbError`] if encoding or any insert fails; the transaction is
/// rolled back on drop in that case.
pub async fn insert_audit_logs(pool: &PgPool, entries: &[AuditLogEntry]) -> Result<u64, DbError> {
    if entries.is_empty() {
        return Ok(0);
    }

    let rows = entries
        .iter()
        .map(AuditLogInsert::from_entry)
        .collect::<Result<Vec<_>, _>>()?;

    let mut tx = pool.begin().await?;
    for row in &rows {
        execute_insert(&mut *tx, row).await?;
    }
    tx.commit().await?;

    Ok(rows.len() as u64)
}

/// Deletes entries older than `retention_days`. Returns rows removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_audit_logs_older_than(
    pool: &PgPool,
    retention_days: u32,
) -> Result<u64, DbError> {
    let days = i32::try_from(retention_days).unwrap_or(i32::MAX);
    let result = sqlx::query(
        "DELETE FROM audit_logs \
         WHERE timestamp < NOW() - make_interval(days => $1)",
    )
    .bind(days)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns entries matching `filters`, newest first, ties broken by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails or [`DbError::Decode`] if a
/// stored row no longer matches the entry schema.
pub async fn query_audit_logs(
    pool: &PgPool,
    filters: &AuditFilters,
) -> Result<Vec<AuditLogEntry>, DbError> {
    let binds = FilterBinds::new(filters);
    let rows = binds
        .bind(sqlx::query_as::<_, AuditLogRow>(concat!(
            "SELECT ",
            audit_columns!(),
            " FROM audit_logs WHERE ",
            audit_filter_clause!(),
            " ORDER BY timestamp DESC, id DESC LIMIT $9 OFFSET $10"
        )))
        .bind(filters.effective_limit())
        .bind(filters.effective_offset())
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(AuditLogEntry::try_from).collect()
}

/// Aggregates the entries matching `filters`. Pagination is ignored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any of the aggregate queries fail.
pub async fn audit_statistics(
    pool: &PgPool,
    filters: &AuditFilters,
) -> Result<AuditStatistics, DbError> {
    let binds = FilterBinds::new(filters);
    let top_n = i64::try_from(TOP_N).unwrap_or(10);

    let (total_events,) = binds
        .bind(sqlx::query_as::<_, (i64,)>(concat!(
            "SELECT COUNT(*) FROM audit_logs WHERE ",
            audit_filter_clause!()
        )))
        .fetch_one(pool)
        .await?;

    let by_type = binds
        .bind(sqlx::query_as::<_, KeyCountRow>(concat!(
            "SELECT event_type AS key, COUNT(*) AS count FROM audit_logs WHERE ",
            audit_filter_clause!(),
            " GROUP BY event_type"
        )))
        .fetch_all(pool)
        .await?;

    let by_severity = binds
        .bind(sqlx::query_as::<_, KeyCountRow>(concat!(
            "SELECT severity AS key, COUNT(*) AS count FROM audit_logs WHERE ",
            audit_filter_clause!(),
            " GROUP BY severity"
        )))
        .fetch_all(pool)
        .await?;

    let hourly = binds
        .bind(sqlx::query_as::<_, HourlyRow>(concat!(
            "SELECT date_trunc('hour', timestamp) AS hour, COUNT(*) AS count \
             FROM audit_logs WHERE ",
            audit_filter_clause!(),
            " AND timestamp >= NOW() - INTERVAL '24 hours' \
             GROUP BY 1 ORDER BY 1"
        )))
        .fetch_all(pool)
        .await?;

    let top_users = binds
        .bind(sqlx::query_as::<_, KeyCountRow>(concat!(
            "SELECT user_id AS key, COUNT(*) AS count FROM audit_logs WHERE ",
            audit_filter_clause!(),
            " AND user_id IS NOT NULL \
             GROUP BY user_id ORDER BY count DESC, key LIMIT $9"
        )))
        .bind(top_n)
        .fetch_all(pool)
        .await?;

    let top_services = binds
        .bind(sqlx::query_as::<_, KeyCountRow>(concat!(
            "SELECT service_id AS key, COUNT(*) AS count FROM audit_logs WHERE ",
            audit_filter_clause!(),
            " GROUP BY service_id ORDER BY count DESC, key LIMIT $9"
        )))
        .bind(top_n)
        .fetch_all(pool)
        .await?;

    let performance = binds
        .bind(sqlx::query_as::<_, PerformanceRow>(concat!(
            "SELECT COUNT(duration_ms) AS sample_count, \
                    AVG(duration_ms) AS avg_duration_ms, \
                    AVG(db_query_count)::float8 AS avg_db_query_count, \
                    (AVG(CASE WHEN cache_hit THEN 1.0 ELSE 0.0 END) \
                        FILTER (WHERE cache_hit IS NOT NULL))::float8 AS cache_hit_rate \
             FROM audit_logs WHERE ",
            audit_filter_clause!()
        )))
        .fetch_one(pool)
        .await?;

    Ok(AuditStatistics {
        total_events,
        events_by_type: by_type.into_iter().map(|r| (r.key, r.count)).collect(),
        events_by_severity: by_severity.into_iter().map(|r| (r.key, r.count)).collect(),
        hourly_events: hourly
            .into_iter()
            .map(|r| HourlyBucket {
                hour: r.hour,
                count: r.count,
            })
            .collect(),
        top_users: top_users
            .into_iter()
            .map(|r| KeyCount {
                key: r.key,
                count: r.count,
            })
            .collect(),
        top_services: top_services
            .into_iter()
            .map(|r| KeyCount {
                key: r.key,
                count: r.count,
            })
            .collect(),
        performance: PerformanceAverages {
            sample_count: performance.sample_count,
            avg_duration_ms: performance.avg_duration_ms,
            avg_db_query_count: performance.avg_db_query_count,
            cache_hit_rate: performance.cache_hit_rate,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn filter_binds_drop_empty_lists() {
        let binds = FilterBinds::new(&AuditFilters::default());
        assert!(binds.event_types.is_none());
        assert!(binds.severities.is_none());
        assert!(binds.tags.is_none());
        assert!(binds.search.is_none());
    }
}
