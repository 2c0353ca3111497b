//! LLM message structures

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tools::output_formatter::format_tool_turn;
use crate::tools::ToolResult;

/// Represents a message in an LLM conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    /// Role of the message sender
    pub role: MessageRole,

    /// Content of the message
    pub content: MessageContent,
}

/// Role of the message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message (instructions)
    System,

    /// User message (human input)
    User,

    /// Assistant message (model response)
    Assistant,

    /// Tool message (tool execution result)
    Tool,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }
}

/// Content of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),

    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

/// A block of content within a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text { text: String },

    /// A call intent extracted from the assistant text in the same message.
    /// Not rendered into prompts; the surrounding text already carries it.
    ToolCall {
        tool_name: String,
        arguments: Map<String, Value>,
    },

    /// The outcome of a tool call, rendered into prompts as plain text
    ToolResult {
        tool_name: String,
        arguments: Map<String, Value>,
        result: ToolResult,
    },
}

impl LlmMessage {
    /// Create a new system message
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::System,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a new user message
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a new assistant message
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Assistant message that requested a tool call
    pub fn assistant_call<S: Into<String>>(
        text: S,
        tool_name: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Blocks(vec![
                ContentBlock::Text { text: text.into() },
                ContentBlock::ToolCall {
                    tool_name: tool_name.into(),
                    arguments,
                },
            ]),
        }
    }

    /// Tool message carrying a result, optionally followed by an instruction
    pub fn tool_result(
        tool_name: impl Into<String>,
        arguments: Map<String, Value>,
        result: ToolResult,
        follow_up: Option<&str>,
    ) -> Self {
        let mut blocks = vec![ContentBlock::ToolResult {
            tool_name: tool_name.into(),
            arguments,
            result,
        }];
        if let Some(text) = follow_up {
            blocks.push(ContentBlock::Text {
                text: text.to_string(),
            });
        }
        Self {
            role: MessageRole::Tool,
            content: MessageContent::Blocks(blocks),
        }
    }

    /// Get the plain text content of the message, ignoring structured blocks
    pub fn get_text(&self) -> Option<String> {
        match &self.content {
            MessageContent::Text(text) => Some(text.clone()),
            MessageContent::Blocks(blocks) => {
                let text_parts: Vec<&str> = blocks
                    .iter()
                    .filter_map(|block| match block {
                        ContentBlock::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                if text_parts.is_empty() {
                    None
                } else {
                    Some(text_parts.join("\n"))
                }
            }
        }
    }

    /// Render the message as the text a backend sees
    pub fn prompt_text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.clone()),
                    ContentBlock::ToolCall { .. } => None,
                    ContentBlock::ToolResult {
                        tool_name,
                        arguments,
                        result,
                    } => Some(format_tool_turn(tool_name, arguments, result)),
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }

    /// The tool result folded into this message, if any
    pub fn tool_result_block(&self) -> Option<(&str, &ToolResult)> {
        match &self.content {
            MessageContent::Text(_) => None,
            MessageContent::Blocks(blocks) => blocks.iter().find_map(|block| match block {
                ContentBlock::ToolResult {
                    tool_name, result, ..
                } => Some((tool_name.as_str(), result)),
                _ => None,
            }),
        }
    }

    /// The call intent recorded on this message, if any
    pub fn tool_call_block(&self) -> Option<(&str, &Map<String, Value>)> {
        match &self.content {
            MessageContent::Text(_) => None,
            MessageContent::Blocks(blocks) => blocks.iter().find_map(|block| match block {
                ContentBlock::ToolCall {
                    tool_name,
                    arguments,
                } => Some((tool_name.as_str(), arguments)),
                _ => None,
            }),
        }
    }
}
