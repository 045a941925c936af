//! Audit trail command handlers for the CLI.

use brandops_audit::AuditService;
use brandops_core::{AuditEventType, AuditFilters, AuditSeverity};
use chrono::{Duration, Utc};
use clap::{Args, Subcommand};

/// Sub-commands available under `audit`.
#[derive(Debug, Subcommand)]
pub enum AuditCommands {
    /// List recent audit entries, newest first
    Query {
        #[command(flatten)]
        filters: FilterArgs,
        /// Maximum number of entries to show
        #[arg(long, default_value = "20")]
        limit: i64,
        /// Print entries as JSON lines instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Summarize audit entries by type, severity, user, and service
    Stats {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Delete entries older than the retention window
    Cleanup {
        /// Days to keep; defaults to BRANDOPS_AUDIT_RETENTION_DAYS
        #[arg(long)]
        retention_days: Option<u32>,
    },
}

#[derive(Debug, Default, Args)]
pub struct FilterArgs {
    /// Event types, e.g. decision_made
    #[arg(long = "event-type", value_delimiter = ',')]
    pub event_types: Vec<AuditEventType>,
    /// Severities, e.g. warn,error
    #[arg(long = "severity", value_delimiter = ',')]
    pub severities: Vec<AuditSeverity>,
    /// Entries carrying any of these tags
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,
    #[arg(long)]
    pub user: Option<String>,
    #[arg(long)]
    pub service: Option<String>,
    /// Case-insensitive text search over message and description
    #[arg(long)]
    pub search: Option<String>,
    /// Only entries from the last N hours
    #[arg(long)]
    pub since_hours: Option<i64>,
}

impl FilterArgs {
    pub fn to_filters(&self) -> AuditFilters {
        AuditFilters {
            event_types: self.event_types.clone(),
            severities: self.severities.clone(),
            tags: self.tags.clone(),
            user_id: self.user.clone(),
            service_id: self.service.clone(),
            search_text: self.search.clone(),
            start_time: self.since_hours.map(|h| Utc::now() - Duration::hours(h)),
            ..AuditFilters::default()
        }
    }
}

/// # Errors
///
/// Returns an error if the audit storage query or cleanup fails.
pub(crate) async fn run(audit: &AuditService, command: AuditCommands) -> anyhow::Result<()> {
    match command {
        AuditCommands::Query {
            filters,
            limit,
            json,
        } => {
            let filters = AuditFilters {
                limit: Some(limit),
                ..filters.to_filters()
            };
            run_query(audit, &filters, json).await
        }
        AuditCommands::Stats { filters } => run_stats(audit, &filters.to_filters()).await,
        AuditCommands::Cleanup { retention_days } => {
            let removed = audit.cleanup(retention_days).await?;
            println!("removed {removed} audit entries");
            Ok(())
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

async fn run_query(audit: &AuditService, filters: &AuditFilters, json: bool) -> anyhow::Result<()> {
    let entries = audit.query(filters).await?;

    if json {
        for entry in &entries {
            println!("{}", serde_json::to_string(entry)?);
        }
        return Ok(());
    }

    if entries.is_empty() {
        println!("no audit entries match the given filters");
        return Ok(());
    }

    println!(
        "{:<21}{:<10}{:<26}MESSAGE",
        "TIMESTAMP", "SEVERITY", "EVENT TYPE"
    );
    for entry in &entries {
        println!(
            "{:<21}{:<10}{:<26}{}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.severity,
            entry.event_type,
            truncate(&entry.message, 70)
        );
    }
    Ok(())
}

async fn run_stats(audit: &AuditService, filters: &AuditFilters) -> anyhow::Result<()> {
    let stats = audit.get_statistics(filters).await?;

    println!("total entries: {}", stats.total_events);
    if stats.total_events == 0 {
        return Ok(());
    }

    println!("\nby type:");
    for (event_type, count) in &stats.events_by_type {
        println!("  {event_type:<28}{count:>8}");
    }
    println!("\nby severity:");
    for (severity, count) in &stats.events_by_severity {
        println!("  {severity:<28}{count:>8}");
    }
    if !stats.top_users.is_empty() {
        println!("\ntop users:");
        for user in &stats.top_users {
            println!("  {:<28}{:>8}", user.key, user.count);
        }
    }
    if !stats.top_services.is_empty() {
        println!("\ntop services:");
        for service in &stats.top_services {
            println!("  {:<28}{:>8}", service.key, service.count);
        }
    }
    if let Some(avg) = stats.performance.avg_duration_ms {
        println!("\naverage duration: {avg:.1}ms");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_appends_ellipsis_past_limit() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn since_hours_sets_start_time() {
        let args = FilterArgs {
            since_hours: Some(2),
            ..FilterArgs::default()
        };
        let start = args.to_filters().start_time.expect("start time");
        let age = Utc::now() - start;
        assert!(age >= Duration::hours(2) && age < Duration::hours(2) + Duration::minutes(1));
    }
}
