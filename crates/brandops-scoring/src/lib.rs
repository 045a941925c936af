//! Persona matching and compliance validation for social brand responses.
//!
//! Both engines are pure and deterministic: identical inputs always produce
//! identical scores, ordering, and reasoning, so audit records can be
//! reproduced later.

pub mod compliance;
pub mod lexicon;
pub mod persona;

mod error;

pub use compliance::{
    ComplianceConfig, ComplianceResult, ComplianceValidationService, ComplianceViolation,
    ComplianceWarning, ToneAnalysis, ViolationType, WarningType,
};
pub use error::ScoringError;
pub use lexicon::lexicon_score;
pub use persona::{
    ConfidenceLevel, ConfidenceThresholds, MatchingFactors, MatchingWeights, PersonaMatch,
    PersonaMatchingEngine,
};
