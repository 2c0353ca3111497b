//! Configuration discovery and merging for the CLI

pub mod loader;

pub use loader::{AppConfig, CliConfigLoader, RawConfig};
