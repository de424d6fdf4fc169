//! Generative-text provider layer for dealscope
//!
//! This crate provides a provider-agnostic way to send a prompt to a
//! text-generation service and get text back. It includes:
//!
//! - Message and completion request/response types
//! - The [`LLMProvider`] trait
//! - Anthropic and OpenAI-compatible providers (behind feature flags)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;

pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::LLMProvider;

#[cfg(any(feature = "anthropic", feature = "openai"))]
pub mod providers;
