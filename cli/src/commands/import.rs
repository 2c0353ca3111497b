//! CSV import command

use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;

use sage_core::store::SqliteEmployeeStore;

use crate::config::CliConfigLoader;

/// Replace the employee table with the rows of `csv_path`
pub async fn import_command(csv_path: PathBuf, config_loader: CliConfigLoader) -> Result<()> {
    let config = config_loader.load().await?;
    let store = SqliteEmployeeStore::open(&config.database).with_context(|| {
        format!("Failed to open employee database: {}", config.database.display())
    })?;

    let report = store
        .import_csv(&csv_path)
        .await
        .with_context(|| format!("Failed to import {}", csv_path.display()))?;

    println!(
        "{} {} employees into {}",
        "Imported".green().bold(),
        report.imported,
        config.database.display()
    );
    if report.skipped > 0 {
        println!(
            "{}",
            format!("skipped {} rows without an EmployeeID", report.skipped).yellow()
        );
    }

    Ok(())
}
