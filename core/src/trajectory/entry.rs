//! Trajectory entry structures

use crate::llm::{LlmMessage, Usage};
use crate::tools::{ParsedCall, ToolResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single entry in a run trajectory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryEntry {
    /// Unique identifier for this entry
    pub id: String,

    /// Timestamp when this entry was created
    pub timestamp: DateTime<Utc>,

    /// Type of entry
    pub entry_type: EntryType,

    /// Generation round the entry belongs to
    pub step: usize,
}

/// Type of trajectory entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryType {
    /// Query received
    QueryStart {
        query: String,
        context_chunks: usize,
        agent_type: String,
        agent_config: serde_json::Value,
    },

    /// Prompt sent to the model
    LlmRequest {
        messages: Vec<LlmMessage>,
        model: String,
        provider: String,
        forced_final: bool,
    },

    /// Model reply
    LlmResponse {
        message: LlmMessage,
        usage: Option<Usage>,
        finish_reason: Option<String>,
    },

    /// Call intent extracted from a reply
    ToolCall { call: ParsedCall },

    /// Outcome folded back into the conversation
    ToolResult { tool_name: String, result: ToolResult },

    /// Run finished
    QueryComplete {
        answer: String,
        tool_used: bool,
        generations: usize,
        duration_ms: u64,
    },

    /// Run aborted
    Error {
        error: String,
        context: Option<String>,
    },
}

impl TrajectoryEntry {
    /// Create a new trajectory entry
    pub fn new(entry_type: EntryType, step: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            entry_type,
            step,
        }
    }

    pub fn query_start(
        query: String,
        context_chunks: usize,
        agent_type: String,
        agent_config: serde_json::Value,
    ) -> Self {
        Self::new(
            EntryType::QueryStart {
                query,
                context_chunks,
                agent_type,
                agent_config,
            },
            0,
        )
    }

    pub fn llm_request(
        messages: Vec<LlmMessage>,
        model: String,
        provider: String,
        forced_final: bool,
        step: usize,
    ) -> Self {
        Self::new(
            EntryType::LlmRequest {
                messages,
                model,
                provider,
                forced_final,
            },
            step,
        )
    }

    pub fn llm_response(
        message: LlmMessage,
        usage: Option<Usage>,
        finish_reason: Option<String>,
        step: usize,
    ) -> Self {
        Self::new(
            EntryType::LlmResponse {
                message,
                usage,
                finish_reason,
            },
            step,
        )
    }

    pub fn tool_call(call: ParsedCall, step: usize) -> Self {
        Self::new(EntryType::ToolCall { call }, step)
    }

    pub fn tool_result(tool_name: String, result: ToolResult, step: usize) -> Self {
        Self::new(EntryType::ToolResult { tool_name, result }, step)
    }

    pub fn query_complete(
        answer: String,
        tool_used: bool,
        generations: usize,
        duration_ms: u64,
    ) -> Self {
        Self::new(
            EntryType::QueryComplete {
                answer,
                tool_used,
                generations,
                duration_ms,
            },
            generations,
        )
    }

    pub fn error(error: String, context: Option<String>, step: usize) -> Self {
        Self::new(EntryType::Error { error, context }, step)
    }
}
