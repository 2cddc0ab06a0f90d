//! LlmProvider trait definition.
//!
//! The core abstraction every LLM backend implements. Uses RPITIT for
//! `complete`; dynamic dispatch goes through [`super::box_provider::BoxLlmProvider`].

use chatsearch_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends (OpenAI, Gemini, Mistral, ...).
///
/// Implementations live in chatsearch-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai", "mistral").
    fn name(&self) -> &str;

    /// Model used when a request leaves `model` empty.
    fn default_model(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
