//! Tool catalog, call extraction and execution

pub mod base;
pub mod builtin;
pub mod executor;
pub mod extract;
pub mod output_formatter;
pub mod registry;
pub mod schema;

pub use base::{FnHandler, ToolHandler, ToolResult, ToolSpec};
pub use executor::ToolExecutor;
pub use extract::{CallExtractor, Extraction, Grammar, ParsedCall};
pub use registry::{ToolCatalog, ToolDescription};
pub use schema::{ParamType, ParameterSchema, ParameterSpec, ToolArguments};
