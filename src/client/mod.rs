//! HTTP client for fetching remote metadata documents.
//!
//! This module provides a synchronous HTTP client that can be used from async contexts
//! via `tokio::task::spawn_blocking`. The client applies a per-request timeout, maps
//! transport failures onto [`FetchError`], and never retries.

mod async_wrapper;
pub use async_wrapper::{AsyncMetadataClient, AsyncMetadataClientImpl};

use crate::config::Config;
use crate::error::{FetchError, FetchResult};
use crate::metrics::Metrics;
use crate::models::token::extract_token_entries;
use crate::models::Repository;
use serde_json::Value;
use std::io::{self, Read};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// HTTP client for the repository document, token lists and template metadata.
///
/// This client uses `ureq` for synchronous HTTP requests and can be called
/// from async contexts using `tokio::task::spawn_blocking`.
#[derive(Clone)]
pub struct MetadataClient {
    /// URL of the repository document
    repository_url: String,

    repository_timeout: Duration,
    token_list_timeout: Duration,
    template_timeout: Duration,

    /// HTTP client agent
    agent: Arc<ureq::Agent>,

    /// Metrics collector
    metrics: Metrics,
}

impl MetadataClient {
    /// Create a new MetadataClient from configuration.
    pub fn new(config: &Config, metrics: Metrics) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(concat!("metadata-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build();

        Self {
            repository_url: config.repository_url.clone(),
            repository_timeout: Duration::from_secs(config.repository_fetch_timeout),
            token_list_timeout: Duration::from_secs(config.token_list_fetch_timeout),
            template_timeout: Duration::from_secs(config.template_fetch_timeout),
            agent: Arc::new(agent),
            metrics,
        }
    }

    /// Get a reference to the metrics collector.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Execute a GET request and parse the body as JSON.
    fn get_json(&self, url: &str, timeout: Duration) -> FetchResult<Value> {
        let start = Instant::now();
        tracing::debug!("GET {} (timeout {:?})", url, timeout);

        let result = self
            .agent
            .get(url)
            .timeout(timeout)
            .set("Accept", "application/json")
            .call()
            .map_err(|e| map_error(e, timeout))
            .and_then(|response| {
                let mut body = String::new();
                response
                    .into_reader()
                    .read_to_string(&mut body)
                    .map_err(|e| map_io_error(e, timeout))?;
                serde_json::from_str::<Value>(&body).map_err(FetchError::Json)
            });

        let duration = start.elapsed();
        self.metrics.record_http_request(duration);
        match &result {
            Ok(_) => tracing::debug!("GET {} - Success ({:?})", url, duration),
            Err(e) => {
                tracing::warn!("GET {} - Error: {}", url, e);
                self.metrics.record_http_error();
            }
        }

        result
    }

    /// Fetch and parse the repository document.
    pub fn get_repository(&self) -> FetchResult<Repository> {
        let document = self.get_json(&self.repository_url, self.repository_timeout)?;
        serde_json::from_value(document).map_err(FetchError::Json)
    }

    /// Fetch a token list and return its raw entries.
    ///
    /// The body may be a bare array or an object with a `tokens` array; an
    /// empty or differently shaped document is [`FetchError::InvalidTokenList`].
    pub fn get_token_list(&self, url: &str) -> FetchResult<Vec<Value>> {
        let document = self.get_json(url, self.token_list_timeout)?;
        extract_token_entries(document)
    }

    /// Fetch one template's metadata document.
    pub fn get_template_metadata(&self, url: &str) -> FetchResult<Value> {
        self.get_json(url, self.template_timeout)
    }
}

/// Map a ureq error to a FetchError.
fn map_error(error: ureq::Error, timeout: Duration) -> FetchError {
    match error {
        ureq::Error::Status(code, response) => {
            let message = response
                .into_string()
                .unwrap_or_else(|_| "Unknown error".to_string());

            match code {
                404 => FetchError::NotFound(message),
                _ => FetchError::Status {
                    status: code,
                    message,
                },
            }
        }
        ureq::Error::Transport(transport) => {
            if is_timeout(&transport) {
                FetchError::Timeout {
                    timeout_secs: timeout.as_secs(),
                }
            } else if transport.kind() == ureq::ErrorKind::ConnectionFailed {
                FetchError::Http("Connection failed".to_string())
            } else {
                FetchError::Http(transport.to_string())
            }
        }
    }
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    if transport.kind() != ureq::ErrorKind::Io {
        return false;
    }
    is_timeout_source(std::error::Error::source(transport))
}

/// Only an underlying `io::Error` of a timeout kind counts as a timeout.
fn is_timeout_source(source: Option<&(dyn std::error::Error + 'static)>) -> bool {
    source
        .and_then(|source| source.downcast_ref::<io::Error>())
        .map(|e| is_timeout_kind(e.kind()))
        .unwrap_or(false)
}

fn is_timeout_kind(kind: io::ErrorKind) -> bool {
    matches!(kind, io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

fn map_io_error(error: io::Error, timeout: Duration) -> FetchError {
    if is_timeout_kind(error.kind()) {
        FetchError::Timeout {
            timeout_secs: timeout.as_secs(),
        }
    } else {
        FetchError::Http(error.to_string())
    }
}
