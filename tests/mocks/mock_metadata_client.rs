use async_trait::async_trait;
use metadata_mcp_server::client::AsyncMetadataClient;
use metadata_mcp_server::error::{FetchError, FetchResult};
use metadata_mcp_server::models::Repository;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted upstream failure, rebuilt into a fresh `FetchError` on every call.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum MockFailure {
    Status(u16),
    Timeout,
    InvalidTokenList,
}

impl MockFailure {
    fn to_error(&self) -> FetchError {
        match self {
            MockFailure::Status(404) => FetchError::NotFound("not found".to_string()),
            MockFailure::Status(status) => FetchError::Status {
                status: *status,
                message: "mock failure".to_string(),
            },
            MockFailure::Timeout => FetchError::Timeout { timeout_secs: 10 },
            MockFailure::InvalidTokenList => {
                FetchError::InvalidTokenList("empty token list".to_string())
            }
        }
    }
}

type Scripted<T> = Result<T, MockFailure>;

/// Mock upstream client for testing.
///
/// Serves a configurable repository document, token lists and template
/// documents keyed by URL, with optional per-URL delays, and tracks method
/// calls for verification.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct MockMetadataClient {
    repository: Arc<Mutex<Option<Scripted<Repository>>>>,
    token_lists: Arc<Mutex<HashMap<String, Scripted<Vec<Value>>>>>,
    templates: Arc<Mutex<HashMap<String, Scripted<Value>>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    call_counts: Arc<Mutex<HashMap<String, usize>>>,
}

#[allow(dead_code)]
impl MockMetadataClient {
    /// Create a new mock with nothing configured.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_repository(&self, repository: Repository) {
        *self.repository.lock().unwrap() = Some(Ok(repository));
    }

    pub fn fail_repository(&self, failure: MockFailure) {
        *self.repository.lock().unwrap() = Some(Err(failure));
    }

    pub fn set_token_list(&self, url: &str, entries: Vec<Value>) {
        self.token_lists
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(entries));
    }

    pub fn fail_token_list(&self, url: &str, failure: MockFailure) {
        self.token_lists
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(failure));
    }

    pub fn set_template(&self, url: &str, document: Value) {
        self.templates
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(document));
    }

    pub fn fail_template(&self, url: &str, failure: MockFailure) {
        self.templates
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(failure));
    }

    /// Delay every response for `key` (a URL, or "repository").
    pub fn set_delay(&self, key: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(key.to_string(), delay);
    }

    /// Get the number of times a method (or URL) was fetched.
    pub fn get_call_count(&self, key: &str) -> usize {
        let counts = self.call_counts.lock().unwrap();
        *counts.get(key).unwrap_or(&0)
    }

    /// Reset all call counts.
    pub fn reset_call_counts(&self) {
        self.call_counts.lock().unwrap().clear();
    }

    fn increment_call_count(&self, key: &str) {
        let mut counts = self.call_counts.lock().unwrap();
        *counts.entry(key.to_string()).or_insert(0) += 1;
    }

    async fn delay_for(&self, key: &str) {
        let delay = self.delays.lock().unwrap().get(key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl AsyncMetadataClient for MockMetadataClient {
    async fn fetch_repository(&self) -> FetchResult<Repository> {
        self.increment_call_count("fetch_repository");
        self.delay_for("repository").await;

        let scripted = self.repository.lock().unwrap().clone();
        match scripted {
            Some(Ok(repository)) => Ok(repository),
            Some(Err(failure)) => Err(failure.to_error()),
            None => Err(FetchError::NotFound("repository".to_string())),
        }
    }

    async fn fetch_token_list(&self, url: &str) -> FetchResult<Vec<Value>> {
        self.increment_call_count("fetch_token_list");
        self.increment_call_count(url);
        self.delay_for(url).await;

        let scripted = self.token_lists.lock().unwrap().get(url).cloned();
        match scripted {
            Some(Ok(entries)) => Ok(entries),
            Some(Err(failure)) => Err(failure.to_error()),
            None => Err(FetchError::NotFound(url.to_string())),
        }
    }

    async fn fetch_template_metadata(&self, url: &str) -> FetchResult<Value> {
        self.increment_call_count("fetch_template_metadata");
        self.increment_call_count(url);
        self.delay_for(url).await;

        let scripted = self.templates.lock().unwrap().get(url).cloned();
        match scripted {
            Some(Ok(document)) => Ok(document),
            Some(Err(failure)) => Err(failure.to_error()),
            None => Err(FetchError::NotFound(url.to_string())),
        }
    }
}
