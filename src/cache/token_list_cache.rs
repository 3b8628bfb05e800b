//! Token-list cache keyed by protocol and normalized chain id.
//!
//! Lists are filtered by chain before they are stored, so the same upstream
//! list may be cached once per requested chain. A hit needs no further
//! filtering.

use crate::cache::TimedCache;
use crate::client::AsyncMetadataClient;
use crate::domain::{ChainId, ProtocolName, ProtocolRegistry};
use crate::error::{MetadataError, MetadataResult};
use crate::metrics::Metrics;
use crate::models::token::normalize_tokens;
use crate::models::TokenInfo;
use std::sync::Arc;
use std::time::Duration;

/// Resolves `(protocol, chain?)` to a validated token list, caching results.
#[derive(Clone)]
pub struct TokenListCache {
    client: Arc<dyn AsyncMetadataClient>,
    protocols: ProtocolRegistry,
    cache: TimedCache<String, Arc<Vec<TokenInfo>>>,
    metrics: Metrics,
}

impl TokenListCache {
    /// Create a token-list cache over the given protocol table.
    pub fn new(
        client: Arc<dyn AsyncMetadataClient>,
        protocols: ProtocolRegistry,
        ttl: Duration,
        metrics: Metrics,
    ) -> Self {
        Self {
            client,
            protocols,
            cache: TimedCache::new(ttl),
            metrics,
        }
    }

    /// Cache key for a protocol and optional chain: `protocol` or `protocol-chain`.
    pub fn cache_key(protocol: &ProtocolName, chain: Option<&ChainId>) -> String {
        match chain {
            Some(chain) => format!("{}-{}", protocol, chain),
            None => protocol.to_string(),
        }
    }

    /// Names of the protocols with a registered token list.
    pub fn supported_protocols(&self) -> Vec<String> {
        self.protocols.supported()
    }

    /// Get the tokens of `protocol`, optionally restricted to one chain.
    ///
    /// Validation runs before the cache is consulted: a blank protocol or an
    /// unknown chain alias fails without touching the cache. The protocol is
    /// only resolved to a URL on a miss.
    pub async fn get_tokens_by_protocol(
        &self,
        protocol: &str,
        chain_selector: Option<&str>,
    ) -> MetadataResult<Arc<Vec<TokenInfo>>> {
        let protocol = ProtocolName::new(protocol)?;
        let chain = chain_selector.map(ChainId::normalize).transpose()?;
        let key = Self::cache_key(&protocol, chain.as_ref());

        let client = self.client.clone();
        let protocols = self.protocols.clone();
        let metrics = self.metrics.clone();
        let (tokens, hit) = self
            .cache
            .get_or_try_insert_with(key.clone(), || async move {
                let url = protocols.resolve(&protocol)?;
                tracing::debug!(protocol = %protocol, url = %url, "Fetching token list");

                let entries = client.fetch_token_list(url).await.map_err(|source| {
                    MetadataError::TokenListFetch {
                        protocol: protocol.to_string(),
                        source,
                    }
                })?;

                let mut tokens = normalize_tokens(&entries);
                if let Some(chain) = &chain {
                    tokens.retain(|token| token.chain_id == chain.as_str());
                }
                metrics.record_tokens_fetched(tokens.len());
                Ok::<_, MetadataError>(Arc::new(tokens))
            })
            .await?;

        self.metrics.record_cache_access("token_list", hit);
        tracing::debug!(key = %key, hit, count = tokens.len(), "Token list resolved");
        Ok(tokens)
    }

    /// Drop every cached list.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Number of cached lists (including expired ones not yet cleaned up).
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
