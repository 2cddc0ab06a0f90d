//! Application state wiring the chat service together.
//!
//! `ChatService` is generic over its store and generator; AppState pins it
//! to the runtime-selected `ChatStore` and the LLM-backed generator.

use std::sync::Arc;

use chatsearch_core::chat::generator::LlmAnswerGenerator;
use chatsearch_core::chat::service::ChatService;
use chatsearch_infra::llm::create_provider;
use chatsearch_infra::store::ChatStore;
use chatsearch_types::config::ServiceConfig;

pub type ConcreteChatService = ChatService<ChatStore, LlmAnswerGenerator>;

/// Shared application state used by the `serve` and `ask` commands.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
}

impl AppState {
    /// Open the configured store and build the LLM provider.
    pub async fn init(config: ServiceConfig) -> anyhow::Result<Self> {
        let store = ChatStore::open(&config.storage).await?;

        let provider = create_provider(&config.llm).map_err(|e| {
            anyhow::anyhow!(
                "cannot create LLM provider '{}': {e} (set LLM_API_KEY or OPENAI_API_KEY)",
                config.llm.provider
            )
        })?;
        let generator = LlmAnswerGenerator::new(provider, &config.llm);

        tracing::info!(
            storage = %store.backend(),
            provider = %config.llm.provider,
            model = %generator.model(),
            serialize_turns = config.serialize_turns,
            "Application state initialized"
        );

        Ok(Self::from_parts(store, generator, config.serialize_turns))
    }

    /// Wire a state from already-built parts.
    pub fn from_parts(store: ChatStore, generator: LlmAnswerGenerator, serialize_turns: bool) -> Self {
        let chat_service = if serialize_turns {
            ChatService::new(store, generator)
        } else {
            ChatService::without_turn_locks(store, generator)
        };

        Self {
            chat_service: Arc::new(chat_service),
        }
    }
}
