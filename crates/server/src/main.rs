//! swproxy server entry point.
//!
//! Boots one caching worker from configuration and serves it as MCP tools on
//! stdio. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swproxy_client::{FetchClient, FetchConfig};
use swproxy_core::{AppConfig, CacheStore, MemoryStore, RecordingHost, ServiceWorker, SqliteStore, StoreKind};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

async fn open_store(config: &AppConfig) -> Result<Arc<dyn CacheStore>> {
    let store: Arc<dyn CacheStore> = match config.store {
        StoreKind::Sqlite => Arc::new(SqliteStore::open(&config.db_path).await?),
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let worker_config = config.worker_config()?;

    tracing::info!(
        generation = %worker_config.cache_name,
        scope = %worker_config.scope,
        store = ?config.store,
        "Starting swproxy server on stdio transport"
    );

    let store = open_store(&config).await?;
    let network = Arc::new(FetchClient::new(FetchConfig::from_app_config(&config)?)?);
    let host = RecordingHost::new();
    let worker = ServiceWorker::new(worker_config, store, network, Arc::new(host.clone()));

    let handler = handler::SwProxyServer::new(worker, host);
    let server = serve_server(handler.clone(), stdio()).await?;
    server.waiting().await?;

    let drained = handler.worker().drain_pending_writes().await;
    tracing::info!(drained, "Shut down");

    Ok(())
}
