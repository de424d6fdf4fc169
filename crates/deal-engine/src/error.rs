//! Error types for the analysis engine

use deal_core::TaskKind;
use std::time::Duration;
use thiserror::Error;

/// Engine errors
///
/// Most of these never leave the engine: extraction and task failures are
/// recovered into default records and fallback outcomes. Only
/// [`EngineError::Contract`] aborts a run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Extraction response was missing, malformed or empty
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// No generative-text provider configured
    #[error("No generative-text provider configured")]
    ProviderUnavailable,

    /// Provider call failed
    #[error("Provider error: {0}")]
    Provider(#[from] deal_llm::LLMError),

    /// Provider call exceeded its time budget
    #[error("Generative call timed out after {0:?}")]
    Timeout(Duration),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Template rendering error
    #[error("Template error: {0}")]
    Template(String),

    /// Scoring computation failed inside a task
    #[error("{task} computation failed: {reason}")]
    Task { task: TaskKind, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reference data invalid
    #[error("Reference data error: {0}")]
    Reference(String),

    /// Contract violation between components
    #[error(transparent)]
    Contract(#[from] deal_core::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Build a task computation error
    pub fn task(task: TaskKind, reason: impl Into<String>) -> Self {
        Self::Task {
            task,
            reason: reason.into(),
        }
    }
}

impl From<minijinja::Error> for EngineError {
    fn from(err: minijinja::Error) -> Self {
        EngineError::Template(err.to_string())
    }
}

/// Convert EngineError to deal_core::Error
impl From<EngineError> for deal_core::Error {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Contract(inner) => inner,
            EngineError::Task { task, reason } => deal_core::Error::TaskFailed { task, reason },
            other => deal_core::Error::SynthesisInputInvalid(other.to_string()),
        }
    }
}
