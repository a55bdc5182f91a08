//! Error taxonomy for the verifier
//!
//! Every variant here is fatal to a run. Path collisions during generation
//! never reach this type: they are retried in place by the generator.

use thiserror::Error;

/// Errors raised while generating, evaluating, or summarising a run
#[derive(Error, Debug)]
pub enum VerifierError {
    #[error("Invalid triangular distribution: min={min}, mode={mode}, max={max} (need min <= mode <= max)")]
    InvalidDistribution { min: f64, mode: f64, max: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Quality aspect '{0}' has no matching factor node in the model graph")]
    AspectNotFound(String),

    #[error("Failed to evaluate '{aspect}': {reason}")]
    Evaluation { aspect: String, reason: String },

    #[error("Statistics failed: {0}")]
    Statistics(String),

    #[error("Invalid quality model: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VerifierError {
    /// True for errors that stem from configuration rather than a trial
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            VerifierError::InvalidDistribution { .. }
                | VerifierError::InvalidConfig(_)
                | VerifierError::AspectNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, VerifierError>;
