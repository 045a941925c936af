mod app_config;
pub mod audit;
mod config;
pub mod context;
pub mod decision;
pub mod event;
mod fixtures;
pub mod persona;
pub mod playbook;

pub use app_config::{AppConfig, AuditStorageKind, Environment};
pub use audit::{
    AuditEventType, AuditFilters, AuditLogEntry, AuditSeverity, AuditStatistics,
    ComplianceFlags, DataClassification, DecisionContext, ErrorDetails, PerformanceMetrics,
    RetentionPolicy, SystemContext, UserContext,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use context::{BrandAsset, BrandContext};
pub use decision::{DecisionOutput, DecisionType};
pub use event::{ContentType, EventType, Platform, SocialEvent};
pub use fixtures::{load_event_file, load_playbook_file};
pub use persona::Persona;
pub use playbook::{BrandPlaybook, RuleSeverity};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FixtureIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    FixtureParse { path: String, reason: String },

    #[error("invalid fixture {path}: {reason}")]
    InvalidFixture { path: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),
}
