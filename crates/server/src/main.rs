//! offgrid server entry point.
//!
//! Provisions and activates the cache generations, then serves MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use offgrid_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod state;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let store = Arc::new(CacheDb::open(&config.db_path).await?);
    let state = state::AppState::new(&config, store)?;

    // Both lifecycle steps finish before any request is served.
    let pinned = config.precache_urls()?;
    state.manager.provision(&pinned).await.context("provisioning static generation")?;
    let swept = state.manager.activate().await.context("activating cache version")?;
    tracing::info!(version = %config.cache_version, swept = swept.len(), "cache generations ready");

    tracing::info!("Starting offgrid server on stdio transport");

    let handler = handler::OffgridServer::new(Arc::new(state));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
