//! Tool-calling orchestration loop

pub mod base;
pub mod config;
pub mod core;
pub mod execution;
pub mod prompt;
pub mod state;

pub use base::{Agent, AgentResult};
pub use config::{AgentBuilder, AgentConfig, MIN_ITERATIONS};
pub use self::core::AgentCore;
pub use execution::{AgentExecution, ToolCallRecord};
pub use state::ConversationState;
