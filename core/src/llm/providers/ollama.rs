//! Ollama client implementation

use crate::config::ResolvedLlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::{
    ChatOptions, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageRole, Usage,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Client for a local or remote Ollama server
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                LlmError::InvalidRequest {
                    message: format!("Invalid header name '{}': {}", key, e),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| LlmError::InvalidRequest {
                message: format!("Invalid header value for '{}': {}", key, e),
            })?;
            headers.insert(name, value);
        }
        if let Some(api_key) = &config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
                LlmError::Authentication {
                    message: e.to_string(),
                }
            })?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| LlmError::Network {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(&messages, options);

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if status == StatusCode::NOT_FOUND && error_text.contains("not found") {
                return Err(LlmError::ModelNotFound {
                    model: self.model.clone(),
                }
                .into());
            }
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message: error_text,
            }
            .into());
        }

        let ollama_response: OllamaResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(self.convert_response(ollama_response))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}

impl OllamaClient {
    fn build_request(&self, messages: &[LlmMessage], options: Option<ChatOptions>) -> OllamaRequest {
        let options = options.unwrap_or_default();

        let messages = messages
            .iter()
            .map(|message| OllamaMessage {
                // Tool output goes back as user text
                role: match message.role {
                    MessageRole::System => "system",
                    MessageRole::Assistant => "assistant",
                    MessageRole::User | MessageRole::Tool => "user",
                }
                .to_string(),
                content: message.prompt_text(),
            })
            .collect();

        OllamaRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
                top_p: options.top_p,
                stop: options.stop,
            },
        }
    }

    fn convert_response(&self, response: OllamaResponse) -> LlmResponse {
        let usage = match (response.prompt_eval_count, response.eval_count) {
            (None, None) => None,
            (prompt, completion) => {
                let prompt_tokens = prompt.unwrap_or(0);
                let completion_tokens = completion.unwrap_or(0);
                Some(Usage {
                    prompt_tokens,
                    completion_tokens,
                    total_tokens: prompt_tokens + completion_tokens,
                })
            }
        };

        LlmResponse {
            message: LlmMessage::assistant(response.message.content),
            usage,
            model: response.model.unwrap_or_else(|| self.model.clone()),
            finish_reason: response.done_reason.as_deref().map(FinishReason::from_label),
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: Option<String>,
    message: OllamaMessage,
    done_reason: Option<String>,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Protocol;
    use crate::tools::ToolResult;
    use serde_json::{json, Map};

    fn client() -> OllamaClient {
        let config = ResolvedLlmConfig::new(Protocol::Ollama, "http://localhost:11434/", "gemma3:4b");
        OllamaClient::new(&config).unwrap()
    }

    #[test]
    fn test_build_request_maps_roles_and_options() {
        let client = client();
        assert_eq!(client.base_url, "http://localhost:11434");

        let messages = vec![
            LlmMessage::system("rules"),
            LlmMessage::user("question"),
            LlmMessage::assistant("CALL tool: search_employees"),
            LlmMessage::tool_result(
                "search_employees",
                Map::new(),
                ToolResult::success(json!([])),
                None,
            ),
        ];
        let request = client.build_request(&messages, None);
        let encoded = serde_json::to_value(&request).unwrap();

        assert_eq!(encoded["stream"], json!(false));
        assert_eq!(encoded["options"]["num_predict"], json!(500));
        assert!(encoded["options"].get("stop").is_none());

        let roles: Vec<&str> = request.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert!(request.messages[3]
            .content
            .contains("Tool 'search_employees' found no results."));
    }

    #[test]
    fn test_convert_response() {
        let raw = json!({
            "model": "gemma3:4b",
            "message": {"role": "assistant", "content": "RAG is retrieval-augmented generation."},
            "done": true,
            "done_reason": "stop",
            "prompt_eval_count": 12,
            "eval_count": 8
        });
        let response: OllamaResponse = serde_json::from_value(raw).unwrap();
        let converted = client().convert_response(response);

        assert_eq!(converted.text(), "RAG is retrieval-augmented generation.");
        assert_eq!(converted.finish_reason, Some(FinishReason::Stop));
        assert_eq!(converted.usage.unwrap().total_tokens, 20);
    }
}
