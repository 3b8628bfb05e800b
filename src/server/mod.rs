//! MCP server implementation for the Metadata MCP Server.
//!
//! Two transports expose the same tools: streamable HTTP (the default, with
//! sessions and bearer auth) and stdio via the rmcp SDK.

pub mod handlers;
pub mod http;
pub mod jsonrpc;

pub use handlers::MetadataMcpServer;
pub use http::{router, AppState, McpSession};

use anyhow::{Context, Result};
use rmcp::transport::io::stdio;
use rmcp::ServiceExt;

/// Run the MCP server with stdio transport.
///
/// This function starts the MCP server and runs it until completion.
/// It communicates via stdin/stdout using the MCP protocol.
pub async fn run_stdio(server: MetadataMcpServer) -> Result<()> {
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

/// Run the HTTP transport on `bind_address` until Ctrl-C.
///
/// On shutdown every session is closed before in-flight connections drain,
/// so open event streams end and the server can exit.
pub async fn run_http(state: AppState, bind_address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!(addr = %bind_address, path = http::MCP_PATH, "Starting MCP HTTP server");

    let sessions = state.sessions.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!(sessions = sessions.count(), "Shutting down, closing sessions");
            sessions.clear();
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
