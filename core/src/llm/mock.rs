//! Scripted LLM client for tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{LlmError, Result};
use crate::llm::{ChatOptions, FinishReason, LlmClient, LlmMessage, LlmResponse};

pub(crate) enum Reply {
    Text(String),
    Fail,
    Hang,
}

/// Replays canned replies in order and records every request it receives.
/// Once the script runs out, the last reply repeats.
pub(crate) struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<String>>,
    requests: Mutex<Vec<Vec<LlmMessage>>>,
}

impl ScriptedClient {
    pub(crate) fn new<S: Into<String>>(replies: Vec<S>) -> Self {
        Self::with_replies(replies.into_iter().map(|r| Reply::Text(r.into())).collect())
    }

    pub(crate) fn with_replies(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<Vec<LlmMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        _options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        self.requests.lock().unwrap().push(messages);

        let next = self.replies.lock().unwrap().pop_front();
        let text = match next {
            Some(Reply::Text(text)) => {
                *self.last.lock().unwrap() = Some(text.clone());
                text
            }
            Some(Reply::Fail) => {
                return Err(LlmError::Network {
                    message: "connection refused".to_string(),
                }
                .into())
            }
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                String::new()
            }
            None => self.last.lock().unwrap().clone().unwrap_or_default(),
        };

        Ok(LlmResponse {
            message: LlmMessage::assistant(text),
            usage: None,
            model: "scripted".to_string(),
            finish_reason: Some(FinishReason::Stop),
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
