//! Base agent trait

use super::execution::AgentExecution;
use crate::error::Result;
use async_trait::async_trait;

/// Result type for agent operations
pub type AgentResult<T> = Result<T>;

/// Answers one question per call; runs share nothing
#[async_trait]
pub trait Agent: Send + Sync {
    /// Answer `query`, with `context` passages from retrieval (possibly empty)
    async fn answer(&self, query: &str, context: &[String]) -> AgentResult<AgentExecution>;

    /// Get the agent's name/type
    fn agent_type(&self) -> &str;
}
