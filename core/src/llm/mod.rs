//! LLM client abstractions and implementations

pub mod client;
pub mod message;
pub mod providers;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{ChatOptions, FinishReason, LlmClient, LlmResponse, Usage};
pub use message::{ContentBlock, LlmMessage, MessageContent, MessageRole};
pub use providers::{create_client, OllamaClient, OpenAiClient};
