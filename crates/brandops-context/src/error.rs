use brandops_db::DbError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("no active playbook for brand {0}")]
    PlaybookNotFound(Uuid),

    #[error("brand context source error: {0}")]
    Source(#[from] DbError),

    #[error("brand context source unavailable: {0}")]
    Unavailable(String),

    #[error("loading brand context for {brand_id} timed out after {timeout_ms}ms")]
    Timeout { brand_id: Uuid, timeout_ms: u64 },
}
