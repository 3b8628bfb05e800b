//! MCP tools exposed by the Metadata MCP Server.
//!
//! This module provides three query tools over the caches:
//! - **getProtocolTokens**: token lists by protocol and chain
//! - **getMiniAppEndpoints**: mini-app endpoints from the repository document
//! - **getMetadataOfTemplate**: template metadata documents, fetched concurrently
//!
//! Both transports dispatch through [`MetadataTools`], so tool behavior does
//! not depend on how the call arrived.

pub mod help;
pub mod mini_apps;
pub mod templates;
pub mod tokens;

pub use mini_apps::GetMiniAppEndpointsParams;
pub use templates::GetMetadataOfTemplateParams;
pub use tokens::{ChainSelector, GetProtocolTokensParams};

use crate::cache::{RepositoryCache, TokenListCache};
use crate::client::AsyncMetadataClient;
use crate::config::Config;
use crate::domain::ProtocolRegistry;
use crate::error::{MetadataError, MetadataResult};
use crate::metrics::Metrics;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const GET_PROTOCOL_TOKENS: &str = "getProtocolTokens";
pub const GET_MINI_APP_ENDPOINTS: &str = "getMiniAppEndpoints";
pub const GET_METADATA_OF_TEMPLATE: &str = "getMetadataOfTemplate";

/// Largest page any tool will return.
pub const MAX_LIMIT: usize = 1000;

/// Validate an optional `limit`, falling back to `default`.
pub fn validate_limit(limit: Option<usize>, default: usize) -> MetadataResult<usize> {
    match limit {
        None => Ok(default),
        Some(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit),
        Some(limit) => Err(MetadataError::InvalidArgument(format!(
            "limit must be between 1 and {} (got {})",
            MAX_LIMIT, limit
        ))),
    }
}

/// What a tool produced: structured JSON or plain usage text.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Json(Value),
    Text(String),
}

impl ToolOutput {
    /// Render as the text content of an MCP tool result.
    pub fn into_text(self) -> String {
        match self {
            ToolOutput::Json(value) => {
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            }
            ToolOutput::Text(text) => text,
        }
    }
}

/// A tool as advertised by `tools/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

pub const PROTOCOL_TOKENS_DESCRIPTION: &str =
    "List tokens from a protocol's token list, optionally restricted to one chain. \
     Supports search, tag filtering, sorting and pagination. Pass help=true for usage.";
pub const MINI_APP_ENDPOINTS_DESCRIPTION: &str =
    "List mini-app endpoints from the metadata repository, filtered by state, category, \
     protocol or host. Pass help=true for usage.";
pub const METADATA_OF_TEMPLATE_DESCRIPTION: &str =
    "Fetch metadata documents for templates matching an id, name, category or protocol. \
     Failed fetches are reported per template. Pass help=true for usage.";

/// The three query tools and the state they share.
#[derive(Clone)]
pub struct MetadataTools {
    repository: RepositoryCache,
    tokens: TokenListCache,
    client: Arc<dyn AsyncMetadataClient>,
    template_timeout: Duration,
}

impl MetadataTools {
    /// Create the tool set.
    ///
    /// # Arguments
    /// * `repository` - Cache over the repository document
    /// * `tokens` - Cache over protocol token lists
    /// * `client` - Fetcher for template metadata (never cached)
    /// * `template_timeout` - Per-template fetch timeout
    pub fn new(
        repository: RepositoryCache,
        tokens: TokenListCache,
        client: Arc<dyn AsyncMetadataClient>,
        template_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            tokens,
            client,
            template_timeout,
        }
    }

    /// Build caches and tools from configuration with the default protocol table.
    pub fn from_config(
        client: Arc<dyn AsyncMetadataClient>,
        config: &Config,
        metrics: Metrics,
    ) -> Self {
        let repository = RepositoryCache::new(
            client.clone(),
            config.repository_cache_ttl(),
            metrics.clone(),
        );
        let tokens = TokenListCache::new(
            client.clone(),
            ProtocolRegistry::default(),
            config.token_list_cache_ttl(),
            metrics,
        );
        Self::new(
            repository,
            tokens,
            client,
            Duration::from_secs(config.template_fetch_timeout),
        )
    }

    pub fn repository(&self) -> &RepositoryCache {
        &self.repository
    }

    pub fn tokens(&self) -> &TokenListCache {
        &self.tokens
    }

    pub async fn get_protocol_tokens(
        &self,
        params: GetProtocolTokensParams,
    ) -> MetadataResult<ToolOutput> {
        tokens::get_protocol_tokens(&self.tokens, params).await
    }

    pub async fn get_mini_app_endpoints(
        &self,
        params: GetMiniAppEndpointsParams,
    ) -> MetadataResult<ToolOutput> {
        mini_apps::get_mini_app_endpoints(&self.repository, params).await
    }

    pub async fn get_metadata_of_template(
        &self,
        params: GetMetadataOfTemplateParams,
    ) -> MetadataResult<ToolOutput> {
        templates::get_metadata_of_template(
            &self.repository,
            self.client.as_ref(),
            self.template_timeout,
            params,
        )
        .await
    }

    /// Dispatch a tool call by name with raw JSON arguments.
    ///
    /// Returns `Ok(None)` when no tool has that name.
    pub async fn call(&self, name: &str, arguments: Value) -> MetadataResult<Option<ToolOutput>> {
        let output = match name {
            GET_PROTOCOL_TOKENS => self.get_protocol_tokens(parse_arguments(arguments)?).await?,
            GET_MINI_APP_ENDPOINTS => {
                self.get_mini_app_endpoints(parse_arguments(arguments)?)
                    .await?
            }
            GET_METADATA_OF_TEMPLATE => {
                self.get_metadata_of_template(parse_arguments(arguments)?)
                    .await?
            }
            _ => return Ok(None),
        };
        Ok(Some(output))
    }

    /// Tool definitions with JSON schemas derived from the parameter types.
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: GET_PROTOCOL_TOKENS,
                description: PROTOCOL_TOKENS_DESCRIPTION,
                input_schema: schema_value(schemars::schema_for!(GetProtocolTokensParams)),
            },
            ToolDefinition {
                name: GET_MINI_APP_ENDPOINTS,
                description: MINI_APP_ENDPOINTS_DESCRIPTION,
                input_schema: schema_value(schemars::schema_for!(GetMiniAppEndpointsParams)),
            },
            ToolDefinition {
                name: GET_METADATA_OF_TEMPLATE,
                description: METADATA_OF_TEMPLATE_DESCRIPTION,
                input_schema: schema_value(schemars::schema_for!(GetMetadataOfTemplateParams)),
            },
        ]
    }
}

fn schema_value<T: Serialize>(schema: T) -> Value {
    serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}))
}

/// Missing arguments are treated as an empty object.
fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> MetadataResult<T> {
    let arguments = if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| MetadataError::InvalidArgument(e.to_string()))
}
