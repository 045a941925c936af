use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("invalid matching weights: {0}")]
    InvalidWeights(String),

    #[error("invalid confidence thresholds: {0}")]
    InvalidThresholds(String),
}
