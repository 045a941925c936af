use std::sync::Arc;

use brandops_audit::AuditService;
use brandops_context::{BrandContextConfig, BrandContextService, PgBrandContextSource};
use brandops_core::AppConfig;
use clap::Subcommand;
use uuid::Uuid;

/// Sub-commands available under `context`.
#[derive(Debug, Subcommand)]
pub enum ContextCommands {
    /// Load brand contexts from the database and report what was cached
    Warm {
        /// Brand ids to load
        #[arg(required = true)]
        brand_ids: Vec<Uuid>,
    },
}

/// # Errors
///
/// Returns an error if no requested brand context could be loaded.
pub(crate) async fn run(
    config: &AppConfig,
    pool: &sqlx::PgPool,
    audit: Arc<AuditService>,
    command: ContextCommands,
) -> anyhow::Result<()> {
    let ContextCommands::Warm { brand_ids } = command;

    let service = BrandContextService::new(
        BrandContextConfig::from_app_config(config),
        Arc::new(PgBrandContextSource::new(pool.clone())),
        Some(audit),
    );
    let loaded = service.preload_brand_contexts(&brand_ids).await;

    println!("{:<38}{:<9}{:<10}PLAYBOOK", "BRAND", "VERSION", "PERSONAS");
    for brand_id in &brand_ids {
        match service.cached_entry(*brand_id).await {
            Some(entry) => println!(
                "{:<38}{:<9}{:<10}{}",
                brand_id,
                entry.context.playbook.version,
                entry.context.personas.len(),
                entry.context.playbook.brand_identity.name
            ),
            None => println!("{brand_id:<38}{:<9}{:<10}not loaded", "-", "-"),
        }
    }

    let metrics = service.metrics().await;
    println!(
        "\nloaded {loaded}/{} brand contexts ({} failures)",
        brand_ids.len(),
        metrics.load_failures
    );

    if loaded == 0 {
        anyhow::bail!("no brand context could be loaded");
    }
    Ok(())
}
