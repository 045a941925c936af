//! Background job scheduler.
//!
//! Registers the audit retention job on a [`JobScheduler`] at server startup.

use std::sync::Arc;

use brandops_audit::AuditService;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    audit: Arc<AuditService>,
    retention_cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_retention_job(&scheduler, audit, retention_cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Purges audit entries past the configured retention window.
async fn register_retention_job(
    scheduler: &JobScheduler,
    audit: Arc<AuditService>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let audit = Arc::clone(&audit);

        Box::pin(async move {
            tracing::info!("scheduler: starting audit retention cleanup");
            match audit.cleanup(None).await {
                Ok(removed) => {
                    tracing::info!(removed, "scheduler: audit retention cleanup complete");
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: audit retention cleanup failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: registered audit retention job");
    Ok(())
}
