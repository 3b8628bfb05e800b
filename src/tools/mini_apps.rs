//! `getMiniAppEndpoints`: mini-app endpoints from the repository document.

use crate::cache::RepositoryCache;
use crate::error::{MetadataError, MetadataResult};
use crate::models::{EndpointState, MiniAppEndpoint};
use crate::tools::{help, validate_limit, ToolOutput, MAX_LIMIT};
use schemars::JsonSchema;
use serde::Deserialize;

/// Parameters for `getMiniAppEndpoints`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetMiniAppEndpointsParams {
    /// Review state: "trusted", "pending" or "rejected"
    #[serde(default)]
    pub state: Option<String>,

    /// Exact category, case-insensitive
    #[serde(default)]
    pub category: Option<String>,

    /// Exact protocol, case-insensitive
    #[serde(default)]
    pub protocol: Option<String>,

    /// Substring of the endpoint host, case-insensitive
    #[serde(default)]
    pub host: Option<String>,

    /// Maximum endpoints to return (max 1000)
    #[serde(default)]
    pub limit: Option<usize>,

    /// Return usage text instead of querying
    #[serde(default)]
    pub help: Option<bool>,
}

/// Endpoint filter built from validated parameters.
#[derive(Debug, Default)]
pub struct EndpointFilter {
    pub state: Option<EndpointState>,
    pub category: Option<String>,
    pub protocol: Option<String>,
    pub host: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

impl EndpointFilter {
    pub fn from_params(params: &GetMiniAppEndpointsParams) -> MetadataResult<Self> {
        let state = match non_blank(params.state.clone()) {
            Some(state) => Some(
                state
                    .parse::<EndpointState>()
                    .map_err(MetadataError::InvalidArgument)?,
            ),
            None => None,
        };

        Ok(Self {
            state,
            category: non_blank(params.category.clone()),
            protocol: non_blank(params.protocol.clone()),
            host: non_blank(params.host.clone()),
        })
    }

    pub fn matches(&self, endpoint: &MiniAppEndpoint) -> bool {
        self.state.map_or(true, |state| endpoint.state == state)
            && self
                .category
                .as_ref()
                .map_or(true, |c| endpoint.category.eq_ignore_ascii_case(c))
            && self
                .protocol
                .as_ref()
                .map_or(true, |p| endpoint.protocol.eq_ignore_ascii_case(p))
            && self
                .host
                .as_ref()
                .map_or(true, |h| endpoint.host.to_lowercase().contains(h))
    }
}

/// Run `getMiniAppEndpoints` against the repository cache.
pub async fn get_mini_app_endpoints(
    repository: &RepositoryCache,
    params: GetMiniAppEndpointsParams,
) -> MetadataResult<ToolOutput> {
    if params.help.unwrap_or(false) {
        return Ok(ToolOutput::Text(help::mini_app_endpoints()));
    }

    let filter = EndpointFilter::from_params(&params)?;
    let limit = validate_limit(params.limit, MAX_LIMIT)?;

    let document = repository.get_repository().await?;
    let mut endpoints: Vec<&MiniAppEndpoint> = document
        .mini_app_endpoints
        .iter()
        .filter(|endpoint| filter.matches(endpoint))
        .collect();
    endpoints.sort_by(|a, b| a.host.cmp(&b.host));

    let total = endpoints.len();
    endpoints.truncate(limit);

    tracing::debug!(total, returned = endpoints.len(), "getMiniAppEndpoints");

    Ok(ToolOutput::Json(serde_json::json!({
        "repositoryVersion": document.version,
        "lastUpdated": document.last_updated,
        "total": total,
        "count": endpoints.len(),
        "endpoints": endpoints,
    })))
}
