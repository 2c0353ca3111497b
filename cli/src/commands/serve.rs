//! HTTP server command

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::bootstrap::build_service;
use crate::config::CliConfigLoader;
use crate::server::router;

/// Serve the HTTP API until interrupted
pub async fn serve_command(host: String, port: u16, config_loader: CliConfigLoader) -> Result<()> {
    let config = config_loader.load().await?;
    let service = build_service(&config, None).await?;

    // Queries answer 503 until a later /reload succeeds
    if let Err(e) = service.reload().await {
        warn!(
            knowledge_file = %config.knowledge_file.display(),
            error = %e,
            "knowledge base not loaded"
        );
    }

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    info!(address = %listener.local_addr()?, "sage server listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}
