mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use brandops_audit::AuditService;
use brandops_context::{BrandContextConfig, BrandContextService, PgBrandContextSource};
use brandops_core::{AuditEventType, AuditSeverity};
use brandops_quality::{DataQualityMonitor, MonitorConfig};
use brandops_scoring::PersonaMatchingEngine;
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(brandops_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = brandops_db::connect_pool_from_config(&config).await?;
    brandops_db::run_migrations(&pool).await?;

    let storage = brandops_audit::storage_from_config(&config, &pool);
    let audit = Arc::new(AuditService::from_app_config(&config, storage));
    record_lifecycle(&audit, AuditEventType::SystemStartup, &config).await;

    let context = BrandContextService::new(
        BrandContextConfig::from_app_config(&config),
        Arc::new(PgBrandContextSource::new(pool.clone())),
        Some(Arc::clone(&audit)),
    );
    context.start();

    let quality = Arc::new(DataQualityMonitor::new(
        MonitorConfig::default(),
        Some(Arc::clone(&audit)),
    ));

    let _scheduler = scheduler::build_scheduler(Arc::clone(&audit), &config.retention_cron).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        brandops_core::Environment::Development
    ))?;
    let state = AppState {
        audit: Arc::clone(&audit),
        context: Arc::clone(&context),
        quality,
        matcher: PersonaMatchingEngine::default(),
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "brandops server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    context.stop();
    record_lifecycle(&audit, AuditEventType::SystemShutdown, &config).await;
    let flushed = audit.shutdown().await?;
    tracing::info!(flushed, "audit buffer flushed on shutdown");
    Ok(())
}

async fn record_lifecycle(
    audit: &AuditService,
    event_type: AuditEventType,
    config: &brandops_core::AppConfig,
) {
    let mut metadata = Map::new();
    metadata.insert("env".to_string(), Value::from(config.env.to_string()));
    metadata.insert(
        "audit_storage".to_string(),
        Value::from(config.audit_storage.to_string()),
    );
    let message = format!("{} {event_type}", config.service_id);
    if let Err(e) = audit
        .log_system_event(event_type, &message, AuditSeverity::Info, metadata)
        .await
    {
        tracing::warn!(error = %e, %event_type, "failed to audit lifecycle event");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
