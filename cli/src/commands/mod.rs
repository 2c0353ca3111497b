//! CLI command implementations

pub mod ask;
pub mod import;
pub mod serve;
pub mod tools;

pub use ask::ask_command;
pub use import::import_command;
pub use serve::serve_command;
pub use tools::tools_command;
