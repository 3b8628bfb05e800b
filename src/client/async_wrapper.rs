//! Async wrapper around the synchronous MetadataClient.
//!
//! This module provides an async interface to the synchronous MetadataClient by using
//! `tokio::task::spawn_blocking` to run HTTP operations on a dedicated thread pool,
//! preventing blocking of the async runtime.

use crate::client::MetadataClient;
use crate::error::{FetchError, FetchResult};
use crate::models::Repository;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Async trait for upstream metadata fetches.
///
/// This is the seam the caches and tools depend on, so tests can substitute
/// a scripted implementation.
#[async_trait]
pub trait AsyncMetadataClient: Send + Sync {
    /// Fetch the repository document.
    async fn fetch_repository(&self) -> FetchResult<Repository>;

    /// Fetch the raw entries of the token list at `url`.
    async fn fetch_token_list(&self, url: &str) -> FetchResult<Vec<Value>>;

    /// Fetch a template metadata document.
    async fn fetch_template_metadata(&self, url: &str) -> FetchResult<Value>;
}

/// Async wrapper around synchronous MetadataClient.
///
/// Uses `tokio::task::spawn_blocking` to run synchronous HTTP
/// operations on a dedicated thread pool.
#[derive(Clone)]
pub struct AsyncMetadataClientImpl {
    client: Arc<MetadataClient>,
}

impl AsyncMetadataClientImpl {
    pub fn new(client: MetadataClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[async_trait]
impl AsyncMetadataClient for AsyncMetadataClientImpl {
    async fn fetch_repository(&self) -> FetchResult<Repository> {
        let client = self.client.clone();

        tokio::task::spawn_blocking(move || client.get_repository())
            .await
            .map_err(|e| FetchError::Http(format!("Task join error: {}", e)))?
    }

    async fn fetch_token_list(&self, url: &str) -> FetchResult<Vec<Value>> {
        let client = self.client.clone();
        let url = url.to_string();

        tokio::task::spawn_blocking(move || client.get_token_list(&url))
            .await
            .map_err(|e| FetchError::Http(format!("Task join error: {}", e)))?
    }

    async fn fetch_template_metadata(&self, url: &str) -> FetchResult<Value> {
        let client = self.client.clone();
        let url = url.to_string();

        tokio::task::spawn_blocking(move || client.get_template_metadata(&url))
            .await
            .map_err(|e| FetchError::Http(format!("Task join error: {}", e)))?
    }
}
