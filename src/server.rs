//! MCP server initialization for stdio and Streamable HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that open the
//! memory store and wire it into the MCP tool handler.

use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::{Arc, Mutex};

use crate::tools::MetamemTools;
use metamem::config::MetamemConfig;
use metamem::memory::MemoryStore;

/// Shared setup: open the store (database + embedding provider).
fn setup_shared_state(
    config: MetamemConfig,
) -> Result<(Arc<Mutex<MemoryStore>>, Arc<MetamemConfig>)> {
    let store = MemoryStore::from_config(&config)?;
    tracing::info!(
        backend = %config.storage.backend,
        db = %config.resolved_db_path().display(),
        model = store.embedding_model(),
        dimensions = store.settings().dimensions,
        "memory store ready"
    );

    Ok((Arc::new(Mutex::new(store)), Arc::new(config)))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: MetamemConfig) -> Result<()> {
    tracing::info!("starting metamem MCP server on stdio");

    let (store, config) = setup_shared_state(config)?;

    let tools = MetamemTools::new(store, config);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP transport.
pub async fn serve_http(config: MetamemConfig) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let bind_addr = format!("{host}:{port}");

    tracing::info!(addr = %bind_addr, "starting metamem MCP server on HTTP");

    let (store, config) = setup_shared_state(config)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(MetamemTools::new(store.clone(), config.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
