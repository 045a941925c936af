//! Audit logging engine for brand-response decisions.
//!
//! Entries are built with [`AuditEventBuilder`], filtered, anonymized and
//! buffered by [`AuditLogger`], and persisted through an [`AuditStorage`]
//! backend. [`AuditService`] is the semantic entry point used by the rest of
//! the workspace.

mod anonymize;
mod builder;
mod error;
mod logger;
mod service;
pub mod storage;

pub use anonymize::{anonymize_entry, anonymize_text, mask_email, mask_ip};
pub use builder::{capture_system_context, AuditEventBuilder};
pub use error::AuditError;
pub use logger::{AuditLogger, AuditLoggerConfig};
pub use service::AuditService;
pub use storage::{storage_from_config, AuditStorage, MemoryAuditStorage, PgAuditStorage};
