//! Metadata MCP Server - Main entry point
//!
//! Serves protocol token lists, mini-app endpoints and template metadata to MCP
//! clients over streamable HTTP (default) or stdio.

use anyhow::Result;
use metadata_mcp_server::client::{AsyncMetadataClient, AsyncMetadataClientImpl};
use metadata_mcp_server::config::TransportMode;
use metadata_mcp_server::server::{AppState, MetadataMcpServer};
use metadata_mcp_server::{Config, MetadataClient, MetadataTools, Metrics, SessionRegistry};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays clean for the stdio transport
    let default_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    info!(
        "Starting Metadata MCP Server ({} transport), repository: {}",
        config.transport, config.repository_url
    );

    let metrics = Metrics::new();
    let sync_client = MetadataClient::new(&config, metrics.clone());
    let client = Arc::new(AsyncMetadataClientImpl::new(sync_client)) as Arc<dyn AsyncMetadataClient>;

    let tools = MetadataTools::from_config(client, &config, metrics.clone());

    info!(
        "Cache TTLs: repository {} min, token lists {} min; session timeout {} min",
        config.repository_cache_ttl_minutes,
        config.token_list_cache_ttl_minutes,
        config.session_timeout_minutes
    );

    match config.transport {
        TransportMode::Stdio => {
            info!("Starting MCP server with stdio transport");
            metadata_mcp_server::server::run_stdio(MetadataMcpServer::new(tools)).await?;
        }
        TransportMode::Http => {
            let sessions = SessionRegistry::new(config.session_timeout(), metrics.clone());
            let state = AppState::new(tools, sessions, config.auth_token.clone(), metrics);
            metadata_mcp_server::server::run_http(state, &config.bind_address()).await?;
        }
    }

    info!("Metadata MCP Server shutdown complete");
    Ok(())
}
