//! Agent execution result structures

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tools::ToolResult;

/// One call folded into a run's conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub arguments: Map<String, Value>,
    pub result: ToolResult,
}

/// Outcome of one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecution {
    /// Final answer text
    pub answer: String,

    /// Whether at least one tool result was folded in
    pub tool_used: bool,

    /// Tool turns taken
    pub iterations: usize,

    /// Generation requests issued, including a forced final one
    pub generations: usize,

    /// Whether the answer came from the budget-exhausted final turn
    pub forced_final: bool,

    pub tool_calls: Vec<ToolCallRecord>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl AgentExecution {
    /// Names of the tools called, in order
    pub fn tools_called(&self) -> Vec<&str> {
        self.tool_calls.iter().map(|c| c.tool_name.as_str()).collect()
    }

    pub fn failed_calls(&self) -> usize {
        self.tool_calls.iter().filter(|c| !c.result.success).count()
    }
}
