//! Error types and handling for Sage Core

use thiserror::Error;

/// Result type alias for Sage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Sage Core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool registration and execution errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Agent execution errors
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// Record store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Knowledge retrieval errors
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Trajectory recording errors
    #[error("Trajectory error: {0}")]
    Trajectory(#[from] TrajectoryError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid configuration format")]
    InvalidFormat,
}

/// LLM client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Generation timed out after {millis} ms")]
    Timeout { millis: u64 },
}

/// Tool registration and execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("unknown tool: {name}")]
    NotFound { name: String },

    #[error("tool already registered: {name}")]
    DuplicateName { name: String },

    #[error("invalid arguments for `{name}`: {message}")]
    InvalidParameters { name: String, message: String },

    /// The handler ran but found nothing matching the request
    #[error("{message}")]
    NoMatch { message: String },

    #[error("tool `{name}` failed: {message}")]
    ExecutionFailed { name: String, message: String },

    #[error("tool `{name}` timed out after {millis} ms")]
    Timeout { name: String, millis: u64 },
}

/// Agent execution errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("Agent not initialized: {message}")]
    NotInitialized { message: String },

    #[error("Failed to render prompt: {message}")]
    Prompt { message: String },
}

/// Record store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Store task failed: {message}")]
    Task { message: String },

    #[error("Import failed at line {line}: {message}")]
    Import { line: usize, message: String },
}

/// Knowledge retrieval errors
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Knowledge file not found: {path}")]
    NotFound { path: String },

    #[error("Failed to read knowledge file {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("Knowledge base not loaded")]
    NotLoaded,
}

/// Trajectory recording errors
#[derive(Error, Debug)]
pub enum TrajectoryError {
    #[error("Failed to record trajectory: {message}")]
    RecordingFailed { message: String },

    #[error("Failed to load trajectory: {path}")]
    LoadFailed { path: String },

    #[error("Invalid trajectory format")]
    InvalidFormat,
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Generic(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Generic(msg.to_string())
    }
}
