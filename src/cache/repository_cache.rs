//! Single-slot cache for the repository document.

use crate::cache::TimedCache;
use crate::client::AsyncMetadataClient;
use crate::error::{MetadataError, MetadataResult};
use crate::metrics::Metrics;
use crate::models::{Repository, TemplatesRepository};
use std::sync::Arc;
use std::time::Duration;

/// Caches the whole repository document for `ttl` after each successful fetch.
///
/// A failed refresh is an error; stale documents are never served.
#[derive(Clone)]
pub struct RepositoryCache {
    client: Arc<dyn AsyncMetadataClient>,
    slot: TimedCache<(), Arc<Repository>>,
    metrics: Metrics,
}

impl RepositoryCache {
    /// Create a new repository cache.
    ///
    /// # Arguments
    /// * `client` - Upstream fetcher
    /// * `ttl` - How long a fetched document stays fresh
    /// * `metrics` - Shared metrics collector
    pub fn new(client: Arc<dyn AsyncMetadataClient>, ttl: Duration, metrics: Metrics) -> Self {
        Self {
            client,
            slot: TimedCache::new(ttl),
            metrics,
        }
    }

    /// Return the cached document, fetching it when absent or expired.
    pub async fn get_repository(&self) -> MetadataResult<Arc<Repository>> {
        let client = self.client.clone();
        let (repository, hit) = self
            .slot
            .get_or_try_insert_with((), || async move {
                tracing::debug!("Repository cache miss, fetching document");
                client
                    .fetch_repository()
                    .await
                    .map(Arc::new)
                    .map_err(MetadataError::RepositoryFetch)
            })
            .await?;

        self.metrics.record_cache_access("repository", hit);
        if !hit {
            tracing::info!(
                version = %repository.version,
                endpoints = repository.mini_app_endpoints.len(),
                template_repositories = repository.templates.len(),
                "Repository document refreshed"
            );
        }
        Ok(repository)
    }

    /// The repository's template section, verbatim.
    pub async fn get_templates(&self) -> MetadataResult<Vec<TemplatesRepository>> {
        Ok(self.get_repository().await?.templates.clone())
    }

    /// Drop the cached document so the next call refetches.
    pub fn invalidate(&self) {
        self.slot.clear();
    }

    /// Whether a fresh document is currently cached.
    pub fn is_fresh(&self) -> bool {
        self.slot.contains_key(&())
    }
}
