//! Per-run conversation state

use serde_json::{Map, Value};

use super::execution::ToolCallRecord;
use super::prompt::{context_turn, question_turn};
use crate::llm::LlmMessage;
use crate::tools::ToolResult;

/// Turns and counters owned by a single run
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub turns: Vec<LlmMessage>,
    /// Tool turns folded in
    pub iterations: usize,
    /// Generation requests issued
    pub generations: usize,
    pub tool_used: bool,
    pub tool_calls: Vec<ToolCallRecord>,
}

impl ConversationState {
    /// System prompt, optional context turn, then the question
    pub fn start(system_prompt: String, context: &[String], query: &str) -> Self {
        let mut turns = vec![LlmMessage::system(system_prompt)];
        if let Some(context) = context_turn(context) {
            turns.push(LlmMessage::user(context));
        }
        turns.push(LlmMessage::user(question_turn(query)));

        Self {
            turns,
            ..Default::default()
        }
    }

    /// Append a call intent and its outcome
    pub fn fold_call(
        &mut self,
        reply: String,
        tool_name: String,
        arguments: Map<String, Value>,
        result: ToolResult,
        follow_up: Option<&str>,
    ) {
        self.turns.push(LlmMessage::assistant_call(
            reply,
            tool_name.clone(),
            arguments.clone(),
        ));
        self.turns.push(LlmMessage::tool_result(
            tool_name.clone(),
            arguments.clone(),
            result.clone(),
            follow_up,
        ));
        self.tool_calls.push(ToolCallRecord {
            tool_name,
            arguments,
            result,
        });
        self.tool_used = true;
        self.iterations += 1;
    }

    pub fn push_user(&mut self, text: &str) {
        self.turns.push(LlmMessage::user(text));
    }

    /// Tool results as they sit in the turn sequence
    pub fn folded_results(&self) -> Vec<(&str, &ToolResult)> {
        self.turns
            .iter()
            .filter_map(LlmMessage::tool_result_block)
            .collect()
    }
}
