//! Generation backend implementations

pub mod ollama;
pub mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use std::sync::Arc;

use crate::config::{Protocol, ResolvedLlmConfig};
use crate::error::Result;
use crate::llm::LlmClient;

/// Build the client for the configured protocol
pub fn create_client(config: &ResolvedLlmConfig) -> Result<Arc<dyn LlmClient>> {
    config.validate()?;

    let client: Arc<dyn LlmClient> = match config.protocol {
        Protocol::Ollama => Arc::new(OllamaClient::new(config)?),
        Protocol::OpenAICompat => Arc::new(OpenAiClient::new(config)?),
    };

    tracing::debug!(
        provider = client.provider_name(),
        model = client.model_name(),
        "created LLM client"
    );
    Ok(client)
}
