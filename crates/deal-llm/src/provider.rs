//! Provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for generative-text providers
///
/// Implementations wrap a specific service (Anthropic, OpenAI-compatible
/// endpoints). Callers treat every error as recoverable.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Provider name (e.g. "anthropic", "openai")
    fn name(&self) -> &str;
}
