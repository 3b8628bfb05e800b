//! MCP tool handlers for the stdio transport.
//!
//! This module implements the three query tools using the rmcp SDK's tool_router pattern.
//! The HTTP transport dispatches to the same [`MetadataTools`], so both transports
//! return identical results and error codes.

use crate::error::MetadataError;
use crate::tools::{
    GetMetadataOfTemplateParams, GetMiniAppEndpointsParams, GetProtocolTokensParams,
    MetadataTools, ToolOutput,
};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use std::borrow::Cow;

/// Server name reported in `initialize` responses.
pub const SERVER_NAME: &str = "metadata-mcp-server";

pub const SERVER_INSTRUCTIONS: &str = "Metadata gateway for decentralized applications - provides protocol token lists, mini-app endpoints, and contract template metadata.";

/// The MCP server that exposes the metadata query tools.
#[derive(Clone)]
pub struct MetadataMcpServer {
    tools: MetadataTools,
    tool_router: ToolRouter<Self>,
}

#[tool_handler]
impl ServerHandler for MetadataMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities {
                tools: Some(Default::default()),
                ..Default::default()
            },
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some(SERVER_INSTRUCTIONS.into()),
        }
    }
}

/// Convert a tool error into an MCP error carrying its code and hint.
pub fn to_mcp_error(e: MetadataError) -> McpError {
    McpError {
        code: ErrorCode(e.error_code()),
        message: Cow::from(e.to_string()),
        data: Some(e.error_data()),
    }
}

fn to_call_result(output: ToolOutput) -> CallToolResult {
    CallToolResult::success(vec![Content::text(output.into_text())])
}

#[tool_router]
impl MetadataMcpServer {
    /// Create a new server over the shared tool set.
    pub fn new(tools: MetadataTools) -> Self {
        Self {
            tools,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "getProtocolTokens",
        description = "List tokens from a protocol's token list, optionally restricted to one chain. Supports search, tag filtering, sorting and pagination. Pass help=true for usage."
    )]
    async fn get_protocol_tokens(
        &self,
        params: Parameters<GetProtocolTokensParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        tracing::info!(protocol = ?params.protocol, "MCP Handler: getProtocolTokens called");

        self.tools
            .get_protocol_tokens(params)
            .await
            .map(to_call_result)
            .map_err(|e| {
                tracing::warn!("getProtocolTokens failed: {}", e);
                to_mcp_error(e)
            })
    }

    #[tool(
        name = "getMiniAppEndpoints",
        description = "List mini-app endpoints from the metadata repository, filtered by state, category, protocol or host. Pass help=true for usage."
    )]
    async fn get_mini_app_endpoints(
        &self,
        params: Parameters<GetMiniAppEndpointsParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("MCP Handler: getMiniAppEndpoints called");

        self.tools
            .get_mini_app_endpoints(params.0)
            .await
            .map(to_call_result)
            .map_err(|e| {
                tracing::warn!("getMiniAppEndpoints failed: {}", e);
                to_mcp_error(e)
            })
    }

    #[tool(
        name = "getMetadataOfTemplate",
        description = "Fetch metadata documents for templates matching an id, name, category or protocol. Failed fetches are reported per template. Pass help=true for usage."
    )]
    async fn get_metadata_of_template(
        &self,
        params: Parameters<GetMetadataOfTemplateParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("MCP Handler: getMetadataOfTemplate called");

        self.tools
            .get_metadata_of_template(params.0)
            .await
            .map(to_call_result)
            .map_err(|e| {
                tracing::warn!("getMetadataOfTemplate failed: {}", e);
                to_mcp_error(e)
            })
    }
}
