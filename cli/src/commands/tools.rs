//! Tools listing command

use anyhow::Result;
use colored::*;
use std::sync::Arc;
use tracing::info;

use sage_core::store::SqliteEmployeeStore;
use sage_core::ToolCatalog;

/// Show the tool catalog the model is offered
pub async fn tools_command(json: bool) -> Result<()> {
    info!("Listing available tools");

    // Descriptions don't depend on the data, so an empty store is enough
    let store = Arc::new(SqliteEmployeeStore::in_memory()?);
    let catalog = ToolCatalog::employee_catalog(store)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog.describe_all())?);
        return Ok(());
    }

    println!("{}\n", "Available Tools".bold());
    for name in catalog.names() {
        let Some(spec) = catalog.lookup(name) else {
            continue;
        };
        println!("{}", spec.name.cyan().bold());
        println!("   {}", spec.description);
        for param in spec.schema.params() {
            let mut line = format!("{}: {}", param.name, param.kind.as_str());
            if !param.required {
                line.push_str(" (optional)");
            }
            if let Some(default) = &param.default {
                line.push_str(&format!(" = {}", default));
            }
            println!("   - {}  {}", line, param.description.dimmed());
        }
        println!();
    }

    Ok(())
}
