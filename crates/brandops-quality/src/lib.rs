//! Data quality monitoring for inbound social events.
//!
//! Malformed or suspicious events are never rejected outright. Each failed
//! rule becomes a [`DataQualityIssue`] that can be reported on and resolved.

mod error;
pub mod issue;
pub mod monitor;
pub mod report;
pub mod rules;

pub use error::{QualityError, RuleError};
pub use issue::{DataQualityIssue, IssueType};
pub use monitor::{DataQualityMonitor, MonitorConfig, ValidationNotification, ValidationOutcome};
pub use report::{QualityMetrics, QualityReport};
pub use rules::{builtin_rules, QualityRule, RuleContext};
