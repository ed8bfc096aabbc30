//! LLM Provider implementations

pub mod ollama;
pub mod openai;
pub mod traits;

pub use ollama::OllamaClient;
pub use openai::OpenAIClient;
pub use traits::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, ProviderError, ProviderResult,
};

use crate::config::{OracleConfig, ProviderKind};
use std::sync::Arc;

/// Build the oracle's chat client from config.
///
/// OpenAI needs `OPENAI_API_KEY` unless a custom base URL points at a
/// compatible local server.
pub fn create_provider(config: &OracleConfig) -> ProviderResult<Arc<dyn LLMProvider>> {
    let provider: Arc<dyn LLMProvider> = match config.provider {
        ProviderKind::Ollama => {
            let mut client = OllamaClient::new()
                .with_rate_limit(config.rpm)
                .with_model(&config.model);
            if let Some(url) = &config.base_url {
                client = client.with_base_url(url);
            }
            Arc::new(client)
        }
        ProviderKind::OpenAI => {
            let client = match (&config.base_url, OpenAIClient::from_env()) {
                (_, Ok(client)) => client,
                (Some(_), Err(_)) => OpenAIClient::new(String::new()),
                (None, Err(e)) => return Err(e),
            };
            let mut client = client.with_rate_limit(config.rpm).with_model(&config.model);
            if let Some(url) = &config.base_url {
                client = client.with_base_url(url);
            }
            Arc::new(client)
        }
    };

    tracing::debug!(
        "Created {} provider with model {}",
        provider.name(),
        provider.default_model()
    );
    Ok(provider)
}
