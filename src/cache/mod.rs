//! Caching layer for the Metadata MCP Server.
//!
//! This module provides a generic time-based cache with TTL support and the two
//! caches built on it: the single-slot repository document cache and the
//! per-(protocol, chain) token-list cache.

pub mod repository_cache;
pub mod timed_cache;
pub mod token_list_cache;

pub use repository_cache::RepositoryCache;
pub use timed_cache::TimedCache;
pub use token_list_cache::TokenListCache;
