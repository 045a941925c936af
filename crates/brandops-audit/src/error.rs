use brandops_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit storage error: {0}")]
    Storage(#[from] DbError),

    #[error("audit storage unavailable: {0}")]
    Unavailable(String),

    #[error("audit storage {operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("audit entry serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
