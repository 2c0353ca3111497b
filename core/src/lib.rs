//! # Sage Core
//!
//! Core library for Sage - retrieval-augmented question answering with
//! tool calling.
//!
//! A text-generating model is shown a fixed catalog of lookups over an
//! employee record store. Its free-text replies are scanned for call intents,
//! the calls are executed, and the results are folded back into the
//! conversation until the model produces a final answer or the iteration
//! budget runs out.

// Core modules
pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod retrieval;
pub mod service;
pub mod store;
pub mod tools;
pub mod trajectory;

// Re-export commonly used types
pub use agent::{Agent, AgentBuilder, AgentConfig, AgentCore, AgentExecution};
pub use config::{ModelParams, Protocol, ResolvedLlmConfig};
pub use error::{Error, Result};
pub use service::{QueryResponse, RagService};
pub use tools::{ToolCatalog, ToolExecutor, ToolResult};
pub use trajectory::TrajectoryRecorder;

/// Current version of the sage-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the library
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

/// Initialize tracing with a specific debug mode
pub fn init_tracing_with_debug(debug: bool) {
    let filter = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}
