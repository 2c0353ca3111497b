//! Wiring shared by the `ask` and `serve` commands

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use sage_core::store::SqliteEmployeeStore;
use sage_core::{AgentBuilder, RagService, ToolCatalog, TrajectoryRecorder};

use crate::config::AppConfig;

/// Open (or create) the employee database
pub async fn open_store(config: &AppConfig) -> Result<Arc<SqliteEmployeeStore>> {
    let store = SqliteEmployeeStore::open(&config.database).with_context(|| {
        format!("Failed to open employee database: {}", config.database.display())
    })?;

    let rows = store.count().await?;
    if rows == 0 {
        warn!(
            database = %config.database.display(),
            "employee database is empty; run `sage import <csv>` first"
        );
    } else {
        debug!(rows, "employee database ready");
    }
    Ok(Arc::new(store))
}

/// Build the store, catalog, agent and service from resolved settings
pub async fn build_service(
    config: &AppConfig,
    trajectory_file: Option<PathBuf>,
) -> Result<Arc<RagService>> {
    let llm_config = config.llm_config()?;
    let store = open_store(config).await?;
    let catalog = ToolCatalog::employee_catalog(store).context("Failed to build tool catalog")?;

    let mut builder = AgentBuilder::new(llm_config)
        .with_agent_config(config.agent.clone())
        .with_catalog(Arc::new(catalog));
    if let Some(path) = trajectory_file {
        builder = builder.with_trajectory_recorder(Arc::new(TrajectoryRecorder::with_file(path)));
    }
    let agent = builder.build().context("Failed to create agent")?;

    Ok(Arc::new(RagService::new(
        Arc::new(agent),
        config.knowledge_file.clone(),
    )))
}
