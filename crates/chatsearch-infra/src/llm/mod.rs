//! LLM provider implementations.
//!
//! Concrete [`LlmProvider`](chatsearch_core::llm::provider::LlmProvider)
//! backends plus [`create_provider`], which picks one from an [`LlmConfig`].

pub mod openai_compat;

use chatsearch_core::llm::box_provider::BoxLlmProvider;
use chatsearch_types::config::LlmConfig;
use chatsearch_types::llm::LlmError;

use self::openai_compat::{OpenAiCompatConfig, OpenAiCompatibleProvider, default_base_url};

/// Create a [`BoxLlmProvider`] from the `[llm]` configuration section.
///
/// An explicit `base_url` wins; otherwise the base URL is inferred from the
/// provider name. Self-hosted endpoints (explicit `base_url`) may run without
/// an API key.
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] when a hosted provider is
/// selected and no API key is configured.
pub fn create_provider(config: &LlmConfig) -> Result<BoxLlmProvider, LlmError> {
    let api_key = config.api_key.as_deref().filter(|k| !k.is_empty());

    let (base_url, api_key) = match config.base_url.as_deref() {
        Some(base_url) => (base_url.to_string(), api_key.unwrap_or_default()),
        None => {
            let key = api_key.ok_or(LlmError::AuthenticationFailed)?;
            (default_base_url(&config.provider).to_string(), key)
        }
    };

    tracing::debug!(
        provider = %config.provider,
        model = %config.model,
        base_url = %base_url,
        "Creating LLM provider"
    );

    let provider = OpenAiCompatibleProvider::new(OpenAiCompatConfig {
        provider_name: config.provider.clone(),
        base_url,
        api_key: api_key.to_string(),
        model: config.model.clone(),
    });
    Ok(BoxLlmProvider::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider_openai_by_name() {
        let config = LlmConfig {
            api_key: Some("sk-openai-test".to_string()),
            ..LlmConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.default_model(), "gpt-4o-mini");
    }

    #[test]
    fn test_create_provider_hosted_requires_key() {
        let config = LlmConfig {
            provider: "mistral".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(
            create_provider(&config),
            Err(LlmError::AuthenticationFailed)
        ));

        let blank = LlmConfig {
            api_key: Some(String::new()),
            ..LlmConfig::default()
        };
        assert!(create_provider(&blank).is_err());
    }

    #[test]
    fn test_create_provider_custom_base_url_without_key() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            model: "llama3".to_string(),
            base_url: Some("http://localhost:11434/v1".to_string()),
            ..LlmConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.default_model(), "llama3");
    }
}
