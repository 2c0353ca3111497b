//! # sage CLI
//!
//! Command-line and HTTP front end for Sage - question answering over a
//! knowledge file with employee record lookups.
//!
//! ## Usage
//!
//! - `sage "question"` - Answer a single question
//! - `sage tools` - Show the tool catalog offered to the model
//! - `sage import employees.csv` - Load employee records into the database
//! - `sage serve` - Run the HTTP API

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod bootstrap;
mod commands;
mod config;
mod server;

use commands::{ask_command, import_command, serve_command, tools_command};
use config::CliConfigLoader;
use sage_core::service::DEFAULT_MAX_CHUNKS;

/// sage - retrieval-augmented question answering with employee lookups
#[derive(Parser)]
#[command(name = "sage")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Answer questions from a knowledge file and an employee database")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Protocol to use (ollama, openai_compat)
    #[arg(long)]
    protocol: Option<String>,

    /// API key override
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL override
    #[arg(long)]
    base_url: Option<String>,

    /// Model name override
    #[arg(long)]
    model: Option<String>,

    /// Knowledge file to retrieve context from
    #[arg(long)]
    knowledge_file: Option<String>,

    /// SQLite database holding employee records
    #[arg(long)]
    database: Option<String>,

    /// Enable verbose logging and show tool activity
    #[arg(short, long)]
    verbose: bool,

    /// Maximum generation requests per question
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Number of context passages to retrieve
    #[arg(long, default_value_t = DEFAULT_MAX_CHUNKS)]
    max_chunks: usize,

    /// Output trajectory file
    #[arg(long)]
    trajectory_file: Option<PathBuf>,

    /// The question to answer
    question: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show available tools
    Tools {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace the employee table with rows from a CSV file
    Import {
        /// CSV file with an EmployeeID and Name header
        csv: PathBuf,
    },

    /// Run the HTTP API
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(protocol) = &cli.protocol {
        loader = loader.with_protocol_override(protocol.clone());
    }

    if let Some(api_key) = &cli.api_key {
        loader = loader.with_api_key_override(api_key.clone());
    }

    if let Some(base_url) = &cli.base_url {
        loader = loader.with_base_url_override(base_url.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    if let Some(path) = &cli.knowledge_file {
        loader = loader.with_knowledge_file_override(path.clone());
    }

    if let Some(path) = &cli.database {
        loader = loader.with_database_override(path.clone());
    }

    if let Some(max_iterations) = cli.max_iterations {
        loader = loader.with_max_iterations_override(max_iterations);
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    sage_core::init_tracing_with_debug(cli.verbose);

    let config_loader = build_config_loader(&cli);

    match (cli.question, cli.command) {
        (Some(question), None) => {
            ask_command(
                question,
                config_loader,
                cli.max_chunks,
                cli.trajectory_file,
                cli.verbose,
            )
            .await
        }
        (Some(_), Some(_)) => {
            anyhow::bail!("Cannot specify both a question and a subcommand")
        }
        (None, Some(Commands::Tools { json })) => tools_command(json).await,
        (None, Some(Commands::Import { csv })) => import_command(csv, config_loader).await,
        (None, Some(Commands::Serve { host, port })) => {
            serve_command(host, port, config_loader).await
        }
        (None, None) => {
            anyhow::bail!("No question given. Run `sage \"your question\"` or `sage --help`")
        }
    }
}
