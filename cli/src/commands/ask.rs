//! Single-question command

use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use sage_core::tools::output_formatter::ToolOutputFormatter;

use crate::bootstrap::build_service;
use crate::config::CliConfigLoader;

fn create_thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.magenta} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Answer one question and print the result
pub async fn ask_command(
    question: String,
    config_loader: CliConfigLoader,
    max_chunks: usize,
    trajectory_file: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let config = config_loader.load().await?;
    let service = build_service(&config, trajectory_file.clone()).await?;

    let chunks = service.reload().await.with_context(|| {
        format!(
            "Failed to load knowledge file: {}",
            config.knowledge_file.display()
        )
    })?;
    info!(chunks, "loaded knowledge base");

    let spinner = create_thinking_spinner();
    let outcome = service.query_with_execution(&question, max_chunks).await;
    spinner.finish_and_clear();
    let (response, execution) = outcome?;

    if verbose {
        let formatter = ToolOutputFormatter::new();
        for call in &execution.tool_calls {
            println!(
                "{}",
                formatter.format_tool_result(&call.tool_name, &call.arguments, &call.result)
            );
        }
        if !response.relevant_chunks.is_empty() {
            println!(
                "{}",
                format!("{} passage(s) of context used", response.relevant_chunks.len()).dimmed()
            );
        }
        println!();
    }

    println!("{}", response.answer);

    if verbose {
        let mut summary = format!(
            "{} generation(s), {} tool call(s), {} ms",
            execution.generations,
            execution.tool_calls.len(),
            execution.duration_ms
        );
        if execution.forced_final {
            summary.push_str(", tool budget exhausted");
        }
        println!("\n{}", summary.dimmed());
    }

    if let Some(path) = trajectory_file {
        println!("{} {}", "Trajectory saved to".dimmed(), path.display());
    }

    Ok(())
}
