//! frost-sw entry point.
//!
//! Boots the offline resource cache and exposes its lifecycle signals as MCP
//! tools on stdio transport. Logging goes to stderr to avoid interfering with
//! the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use frost_client::{FetchClient, FetchConfig, ServiceWorker, Transport};
use frost_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.cache_name, scope = %config.scope, "Starting frost-sw on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let transport = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let worker = Arc::new(ServiceWorker::from_app_config(&config, db, Arc::clone(&transport))?);

    if config.install_on_start {
        boot(&worker).await;
    }

    let handler = handler::FrostServer::new(Arc::clone(&worker), transport);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;
    worker.settle().await;

    Ok(())
}

/// Dispatch install then activate, as a runtime does on registration.
///
/// Failures are logged; the most recently activated generation keeps
/// serving until an install succeeds.
async fn boot<T: Transport>(worker: &ServiceWorker<T>) {
    if worker.install().await.is_err() {
        return;
    }
    if let Err(e) = worker.activate().await {
        tracing::error!(error = %e, "activation failed");
    }
}
