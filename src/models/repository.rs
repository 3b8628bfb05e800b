//! Repository document model: the upstream JSON describing integrator
//! domains, mini-app endpoints, contract templates and malicious domains.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The full repository document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Repository {
    /// When the document was last regenerated upstream
    pub last_updated: String,

    /// Document schema/content version
    pub version: String,

    /// Domains of known integrators
    pub integrator_domains: Vec<IntegratorDomain>,

    /// Vetted mini-app endpoints (entries that fail to parse are skipped)
    #[serde(deserialize_with = "deserialize_endpoints")]
    pub mini_app_endpoints: Vec<MiniAppEndpoint>,

    /// Template repositories grouped by base URL
    pub templates: Vec<TemplatesRepository>,

    /// Domains reported as malicious
    pub malicious_domains: Vec<MaliciousDomain>,
}

/// An integrator's registered domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegratorDomain {
    pub domain: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<String>,
}

/// A domain flagged as malicious.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MaliciousDomain {
    pub domain: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<String>,
}

/// Review state of a mini-app endpoint.
///
/// Parsed case-insensitively from the upstream document.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum EndpointState {
    Trusted,
    #[default]
    Pending,
    Rejected,
}

impl EndpointState {
    /// All states, in display order.
    pub const ALL: [EndpointState; 3] = [
        EndpointState::Trusted,
        EndpointState::Pending,
        EndpointState::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointState::Trusted => "trusted",
            EndpointState::Pending => "pending",
            EndpointState::Rejected => "rejected",
        }
    }
}

impl fmt::Display for EndpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trusted" => Ok(EndpointState::Trusted),
            "pending" => Ok(EndpointState::Pending),
            "rejected" => Ok(EndpointState::Rejected),
            other => Err(format!(
                "Invalid state '{}', expected one of: trusted, pending, rejected",
                other
            )),
        }
    }
}

impl<'de> Deserialize<'de> for EndpointState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Keep the endpoints that parse; one bad entry must not sink the document.
fn deserialize_endpoints<'de, D>(deserializer: D) -> Result<Vec<MiniAppEndpoint>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    let total = raw.len();
    let endpoints: Vec<MiniAppEndpoint> = raw
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(endpoint) => Some(endpoint),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed mini-app endpoint");
                None
            }
        })
        .collect();

    if endpoints.len() < total {
        tracing::debug!(kept = endpoints.len(), total, "Mini-app endpoints parsed");
    }
    Ok(endpoints)
}

/// A mini-app endpoint entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MiniAppEndpoint {
    pub host: String,
    pub state: EndpointState,
    pub category: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,

    pub verified_at: String,
    pub protocol: String,
    pub endpoint: String,
}

/// A set of template categories served from one base URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplatesRepository {
    pub base_url: String,
    pub categories: Vec<TemplateCategory>,
}

/// A named group of templates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TemplateCategory {
    pub id: String,
    pub name: String,
    pub templates: Vec<Template>,
}

/// A single contract template whose metadata lives at `endpoint`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub protocol: String,
    pub endpoint: String,
}

impl Template {
    /// Absolute URL of this template's metadata document.
    ///
    /// Absolute endpoints are returned unchanged; relative ones are joined
    /// onto `base_url` with exactly one separating slash.
    pub fn metadata_url(&self, base_url: &str) -> String {
        if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://") {
            return self.endpoint.clone();
        }
        let base = base_url.trim_end_matches('/');
        let path = self.endpoint.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}
