//! `getMetadataOfTemplate`: fan-out fetch of template metadata documents.
//!
//! Every matching template is fetched concurrently under its own timeout. A
//! slow or failing template is reported in `errors` and never fails the call.

use crate::cache::RepositoryCache;
use crate::client::AsyncMetadataClient;
use crate::error::{FetchError, MetadataError, MetadataResult};
use crate::models::{Template, TemplateCategory, TemplatesRepository};
use crate::tools::{help, ToolOutput};
use futures::future::join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Duration;

/// Parameters for `getMetadataOfTemplate`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetMetadataOfTemplateParams {
    /// Exact template id
    #[serde(default)]
    pub template_id: Option<String>,

    /// Substring of the template name, case-insensitive
    #[serde(default)]
    pub template_name: Option<String>,

    /// Category id or name, case-insensitive
    #[serde(default)]
    pub category: Option<String>,

    /// Exact protocol, case-insensitive
    #[serde(default)]
    pub protocol: Option<String>,

    /// Return usage text instead of querying
    #[serde(default)]
    pub help: Option<bool>,
}

/// A template selected for fetching, with the context it was found in.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateMatch {
    pub template: Template,
    pub category_id: String,
    pub url: String,
}

/// A successfully fetched template document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResult {
    pub template_id: String,
    pub name: String,
    pub category: String,
    pub protocol: String,
    pub url: String,
    pub metadata: Value,
}

/// A template whose fetch failed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFailure {
    pub template_id: String,
    pub url: String,
    pub kind: &'static str,
    pub error: String,
}

struct Selector {
    id: Option<String>,
    name: Option<String>,
    category: Option<String>,
    protocol: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Selector {
    fn from_params(params: &GetMetadataOfTemplateParams) -> MetadataResult<Self> {
        let selector = Self {
            id: non_blank(&params.template_id),
            name: non_blank(&params.template_name).map(|n| n.to_lowercase()),
            category: non_blank(&params.category),
            protocol: non_blank(&params.protocol),
        };
        if selector.id.is_none()
            && selector.name.is_none()
            && selector.category.is_none()
            && selector.protocol.is_none()
        {
            return Err(MetadataError::InvalidArgument(
                "at least one of templateId, templateName, category or protocol is required"
                    .to_string(),
            ));
        }
        Ok(selector)
    }

    fn matches(&self, category: &TemplateCategory, template: &Template) -> bool {
        self.id.as_ref().map_or(true, |id| template.id == *id)
            && self
                .name
                .as_ref()
                .map_or(true, |name| template.name.to_lowercase().contains(name))
            && self.category.as_ref().map_or(true, |c| {
                category.id.eq_ignore_ascii_case(c) || category.name.eq_ignore_ascii_case(c)
            })
            && self
                .protocol
                .as_ref()
                .map_or(true, |p| template.protocol.eq_ignore_ascii_case(p))
    }
}

/// Collect templates matching `params` across every template repository.
pub fn find_templates(
    repositories: &[TemplatesRepository],
    params: &GetMetadataOfTemplateParams,
) -> MetadataResult<Vec<TemplateMatch>> {
    let selector = Selector::from_params(params)?;

    let matches: Vec<TemplateMatch> = repositories
        .iter()
        .flat_map(|repo| {
            repo.categories.iter().flat_map(move |category| {
                category.templates.iter().map(move |template| (repo, category, template))
            })
        })
        .filter(|(_, category, template)| selector.matches(category, template))
        .map(|(repo, category, template)| TemplateMatch {
            template: template.clone(),
            category_id: category.id.clone(),
            url: template.metadata_url(&repo.base_url),
        })
        .collect();

    if matches.is_empty() {
        let categories: BTreeSet<&str> = repositories
            .iter()
            .flat_map(|repo| repo.categories.iter().map(|c| c.id.as_str()))
            .collect();
        let hint = if categories.is_empty() {
            "The repository lists no template categories".to_string()
        } else {
            format!(
                "Available categories: {}",
                categories.into_iter().collect::<Vec<_>>().join(", ")
            )
        };
        return Err(MetadataError::NotFound {
            message: "no template matches the given selectors".to_string(),
            hint: Some(hint),
        });
    }

    Ok(matches)
}

async fn fetch_one(
    client: &dyn AsyncMetadataClient,
    selected: TemplateMatch,
    timeout: Duration,
) -> Result<TemplateResult, TemplateFailure> {
    let outcome = match tokio::time::timeout(timeout, client.fetch_template_metadata(&selected.url))
        .await
    {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            timeout_secs: timeout.as_secs(),
        }),
    };

    match outcome {
        Ok(metadata) => Ok(TemplateResult {
            template_id: selected.template.id,
            name: selected.template.name,
            category: selected.category_id,
            protocol: selected.template.protocol,
            url: selected.url,
            metadata,
        }),
        Err(err) => {
            tracing::warn!(template = %selected.template.id, url = %selected.url, error = %err, "Template fetch failed");
            Err(TemplateFailure {
                template_id: selected.template.id,
                url: selected.url,
                kind: if err.is_timeout() { "timeout" } else { "upstream" },
                error: err.to_string(),
            })
        }
    }
}

/// Fetch every match concurrently; results and failures keep match order.
pub async fn fetch_templates(
    client: &dyn AsyncMetadataClient,
    matches: Vec<TemplateMatch>,
    timeout: Duration,
) -> (Vec<TemplateResult>, Vec<TemplateFailure>) {
    let outcomes = join_all(
        matches
            .into_iter()
            .map(|selected| fetch_one(client, selected, timeout)),
    )
    .await;

    let mut results = Vec::new();
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(failure) => errors.push(failure),
        }
    }
    (results, errors)
}

/// Run `getMetadataOfTemplate`.
pub async fn get_metadata_of_template(
    repository: &RepositoryCache,
    client: &dyn AsyncMetadataClient,
    timeout: Duration,
    params: GetMetadataOfTemplateParams,
) -> MetadataResult<ToolOutput> {
    if params.help.unwrap_or(false) {
        return Ok(ToolOutput::Text(help::metadata_of_template()));
    }

    let document = repository.get_repository().await?;
    let matches = find_templates(&document.templates, &params)?;
    let matched = matches.len();

    let (results, errors) = fetch_templates(client, matches, timeout).await;
    tracing::info!(
        matched,
        succeeded = results.len(),
        failed = errors.len(),
        "getMetadataOfTemplate"
    );

    Ok(ToolOutput::Json(serde_json::json!({
        "matched": matched,
        "succeeded": results.len(),
        "failed": errors.len(),
        "results": results,
        "errors": errors,
    })))
}
