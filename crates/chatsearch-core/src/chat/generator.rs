//! Answer generation from a question plus prior chat history.
//!
//! `AnswerGenerator` is the seam the orchestrator calls; `LlmAnswerGenerator`
//! implements it on top of any [`BoxLlmProvider`].

use tracing::{Instrument, debug, info_span};

use chatsearch_types::chat::Message;
use chatsearch_types::config::LlmConfig;
use chatsearch_types::error::GenerationError;
use chatsearch_types::llm::{CompletionRequest, LlmMessage, MessageRole};

use crate::llm::box_provider::BoxLlmProvider;

/// Number of answer characters echoed into debug logs.
const ANSWER_PREVIEW_CHARS: usize = 100;

/// Produces an answer for `question` given the chat's earlier messages.
///
/// `history` is in chat order and never contains `question` itself.
pub trait AnswerGenerator: Send + Sync {
    fn generate(
        &self,
        question: &str,
        history: &[Message],
    ) -> impl std::future::Future<Output = Result<String, GenerationError>> + Send;
}

/// Answer generator backed by an LLM provider.
///
/// Request layout: system prompt, then the history in order, then the
/// question as the final user message.
pub struct LlmAnswerGenerator {
    provider: BoxLlmProvider,
    model: String,
    system_prompt: String,
    temperature: f64,
    max_tokens: u32,
}

impl LlmAnswerGenerator {
    pub fn new(provider: BoxLlmProvider, config: &LlmConfig) -> Self {
        let model = if config.model.is_empty() {
            provider.default_model().to_string()
        } else {
            config.model.clone()
        };

        tracing::info!(provider = provider.name(), model = %model, "Answer generator initialized");

        Self {
            provider,
            model,
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the completion request for one turn.
    pub fn build_request(&self, question: &str, history: &[Message]) -> CompletionRequest {
        let mut messages: Vec<LlmMessage> = history
            .iter()
            .map(|m| LlmMessage {
                role: m.role,
                content: m.content.clone(),
            })
            .collect();

        messages.push(LlmMessage {
            role: MessageRole::User,
            content: question.to_string(),
        });

        CompletionRequest {
            model: self.model.clone(),
            messages,
            system: Some(self.system_prompt.clone()),
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        }
    }
}

impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate(&self, question: &str, history: &[Message]) -> Result<String, GenerationError> {
        debug!(history_len = history.len(), "Generating answer");

        let request = self.build_request(question, history);

        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
        );

        let response = self.provider.complete(&request).instrument(span).await?;

        let preview: String = response.content.chars().take(ANSWER_PREVIEW_CHARS).collect();
        debug!(
            stop_reason = %response.stop_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            preview = %preview,
            "Generated answer"
        );

        Ok(response.content)
    }
}
