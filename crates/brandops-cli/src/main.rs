mod audit;
mod check;
mod context;

use std::sync::Arc;

use brandops_audit::{capture_system_context, AuditLogger, AuditLoggerConfig, AuditService};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::{
    audit::AuditCommands,
    check::{ComplianceCommands, QualityCommands},
    context::ContextCommands,
};

#[derive(Debug, Parser)]
#[command(name = "brandops-cli")]
#[command(about = "Brand response operations command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Query, summarize, and purge the audit trail
    Audit {
        #[command(subcommand)]
        command: AuditCommands,
    },
    /// Run the data quality rules against an event file
    Quality {
        #[command(subcommand)]
        command: QualityCommands,
    },
    /// Validate event text against a brand playbook
    Compliance {
        #[command(subcommand)]
        command: ComplianceCommands,
    },
    /// Manage the brand context cache
    Context {
        #[command(subcommand)]
        command: ContextCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("brandops-cli ready; run with --help to list commands");
        return Ok(());
    };

    match command {
        // Offline commands never touch config or the database.
        Commands::Quality { command } => check::run_quality(command).await,
        Commands::Compliance { command } => check::run_compliance(command),
        Commands::Migrate => {
            let config = brandops_core::load_app_config()?;
            let pool = brandops_db::connect_pool_from_config(&config).await?;
            let applied = brandops_db::run_migrations(&pool).await?;
            println!("migrations up to date ({applied} applied)");
            Ok(())
        }
        Commands::Audit { command } => {
            let config = brandops_core::load_app_config()?;
            let pool = brandops_db::connect_pool_from_config(&config).await?;
            let audit = build_audit_service(&config, &pool);
            let result = audit::run(&audit, command).await;
            audit.shutdown().await?;
            result
        }
        Commands::Context { command } => {
            let config = brandops_core::load_app_config()?;
            let pool = brandops_db::connect_pool_from_config(&config).await?;
            let audit = build_audit_service(&config, &pool);
            let result = context::run(&config, &pool, Arc::clone(&audit), command).await;
            audit.shutdown().await?;
            result
        }
    }
}

/// Audit service without a background flush task. Callers flush on exit
/// with [`AuditService::shutdown`].
fn build_audit_service(config: &brandops_core::AppConfig, pool: &sqlx::PgPool) -> Arc<AuditService> {
    let logger = AuditLogger::new(
        AuditLoggerConfig::from_app_config(config),
        capture_system_context("brandops-cli", &config.env.to_string()),
        brandops_audit::storage_from_config(config, pool),
    );
    Arc::new(AuditService::new(logger))
}
