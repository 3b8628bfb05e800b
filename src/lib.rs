//! Metadata MCP Server - a Model Context Protocol gateway for decentralized-app metadata.
//!
//! This library serves protocol token lists, mini-app endpoints and contract
//! template metadata to MCP clients, caching the upstream documents it reads.
//!
//! # Architecture
//!
//! - **domain**: Chain id normalization and the protocol token-list table
//! - **models**: Repository document and token list data structures
//! - **error**: Custom error types and JSON-RPC error codes
//! - **config**: Configuration management from environment variables
//! - **client**: HTTP client for upstream documents
//! - **cache**: TTL caches for the repository document and token lists
//! - **session**: Session registry with sliding inactivity expiry
//! - **tools**: The three MCP query tools
//! - **server**: HTTP and stdio MCP transports

pub mod cache;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod models;
pub mod server;
pub mod session;
pub mod tools;

pub use cache::{RepositoryCache, TimedCache, TokenListCache};
pub use client::{AsyncMetadataClient, MetadataClient};
pub use config::Config;
pub use domain::{ChainId, ProtocolName, ProtocolRegistry};
pub use error::{ConfigError, FetchError, MetadataError};
pub use metrics::{Metrics, MetricsSummary};
pub use models::{Repository, TokenInfo};
pub use server::MetadataMcpServer;
pub use session::{ConnectionHandle, SessionRegistry};
pub use tools::{MetadataTools, ToolOutput};
