//! Error types for deal-core

use crate::TaskKind;
use thiserror::Error;

/// Result type alias for deal-core
pub type Result<T> = std::result::Result<T, Error>;

/// Contract-level errors
///
/// None of these are expected during normal operation. Task and extraction
/// failures are recovered where they happen; what reaches this type is a
/// broken contract between components.
#[derive(Error, Debug)]
pub enum Error {
    /// An analysis task failed internally (recovered into a fallback outcome)
    #[error("{task} failed: {reason}")]
    TaskFailed {
        /// Task that failed
        task: TaskKind,
        /// Failure description
        reason: String,
    },

    /// An outcome violates the score/confidence contract
    #[error("Invalid outcome from {task}: {detail}")]
    InvalidOutcome {
        /// Producing task
        task: TaskKind,
        /// What was wrong
        detail: String,
    },

    /// The synthesizer received an outcome set it cannot combine
    #[error("Synthesis input invalid: {0}")]
    SynthesisInputInvalid(String),
}

impl Error {
    /// Whether this error is allowed to abort an analysis run
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidOutcome { .. } | Self::SynthesisInputInvalid(_)
        )
    }
}
