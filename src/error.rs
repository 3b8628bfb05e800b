//! Error types for the Metadata MCP Server.
//!
//! This module defines custom error types using `thiserror` for precise error handling.
//! Upstream failures are [`FetchError`]s; everything a tool can report to a caller is a
//! [`MetadataError`], which knows its JSON-RPC error code and remediation hint.

use crate::domain::ValidationError;
use thiserror::Error;

/// JSON-RPC error codes used across both transports.
pub mod codes {
    /// Unknown, expired, or missing session.
    pub const INVALID_SESSION: i32 = -32000;
    /// Missing or wrong bearer token.
    pub const UNAUTHORIZED: i32 = -32001;
    pub const UNSUPPORTED_PROTOCOL: i32 = -32010;
    pub const UNKNOWN_CHAIN: i32 = -32011;
    pub const UPSTREAM_TIMEOUT: i32 = -32012;
    pub const UPSTREAM_FAILURE: i32 = -32013;
    pub const NOT_FOUND: i32 = -32014;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const PARSE_ERROR: i32 = -32700;
}

/// Errors that can occur when fetching remote metadata documents.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Upstream returned a non-success status code
    #[error("Upstream error (status {status}): {message}")]
    Status { status: u16, message: String },

    /// Failed to parse JSON response
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The request did not complete within its timeout
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Upstream document not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Token-list body was neither an array nor an object with a `tokens` array,
    /// or the list was empty
    #[error("Invalid or empty token list: {0}")]
    InvalidTokenList(String),
}

impl FetchError {
    /// Whether this failure is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

/// Errors a query tool reports back to the caller.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Protocol argument missing or blank
    #[error("Protocol is required")]
    ProtocolRequired,

    /// Chain selector was neither numeric nor a known alias
    #[error("Unknown chain: {0}")]
    UnknownChain(String),

    /// No token list is registered for this protocol
    #[error("Unsupported protocol: {protocol}")]
    UnsupportedProtocol {
        protocol: String,
        supported: Vec<String>,
    },

    /// Any other bad or missing argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Query matched nothing
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        hint: Option<String>,
    },

    /// Repository document could not be refreshed
    #[error("Failed to fetch repository: {0}")]
    RepositoryFetch(#[source] FetchError),

    /// Token list could not be fetched or parsed
    #[error("Failed to fetch token list for {protocol}: {source}")]
    TokenListFetch {
        protocol: String,
        #[source]
        source: FetchError,
    },
}

impl MetadataError {
    /// The upstream failure behind this error, if any.
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            MetadataError::RepositoryFetch(source) => Some(source),
            MetadataError::TokenListFetch { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Whether the underlying failure was an upstream timeout.
    pub fn is_timeout(&self) -> bool {
        self.fetch_error().is_some_and(FetchError::is_timeout)
    }

    /// JSON-RPC error code for this error.
    pub fn error_code(&self) -> i32 {
        match self {
            MetadataError::ProtocolRequired | MetadataError::InvalidArgument(_) => {
                codes::INVALID_PARAMS
            }
            MetadataError::UnknownChain(_) => codes::UNKNOWN_CHAIN,
            MetadataError::UnsupportedProtocol { .. } => codes::UNSUPPORTED_PROTOCOL,
            MetadataError::NotFound { .. } => codes::NOT_FOUND,
            MetadataError::RepositoryFetch(_) | MetadataError::TokenListFetch { .. } => {
                if self.is_timeout() {
                    codes::UPSTREAM_TIMEOUT
                } else {
                    codes::UPSTREAM_FAILURE
                }
            }
        }
    }

    /// Short machine-readable category, carried in the error data.
    pub fn kind(&self) -> &'static str {
        match self {
            MetadataError::ProtocolRequired | MetadataError::InvalidArgument(_) => "validation",
            MetadataError::UnknownChain(_) => "unknown_chain",
            MetadataError::UnsupportedProtocol { .. } => "unsupported_protocol",
            MetadataError::NotFound { .. } => "not_found",
            _ if self.is_timeout() => "timeout",
            _ => "upstream",
        }
    }

    /// Human-readable remediation hint.
    pub fn hint(&self) -> Option<String> {
        match self {
            MetadataError::ProtocolRequired => Some(
                "Pass a protocol name, e.g. {\"protocol\": \"uniswap\"}. Use {\"help\": true} for usage."
                    .to_string(),
            ),
            MetadataError::UnknownChain(_) => Some(format!(
                "Use a numeric chain id or one of: {}",
                crate::domain::chain::known_aliases().join(", ")
            )),
            MetadataError::UnsupportedProtocol { supported, .. } => {
                Some(format!("Supported protocols: {}", supported.join(", ")))
            }
            MetadataError::InvalidArgument(_) => {
                Some("Call the tool with {\"help\": true} for usage.".to_string())
            }
            MetadataError::NotFound { hint, .. } => hint.clone(),
            _ if self.is_timeout() => Some("The upstream source was slow; retry later.".to_string()),
            _ => None,
        }
    }

    /// Structured `data` payload for a JSON-RPC error.
    pub fn error_data(&self) -> serde_json::Value {
        let mut data = serde_json::json!({
            "kind": self.kind(),
            "retryable": self.is_timeout(),
        });
        if let Some(hint) = self.hint() {
            data["hint"] = serde_json::Value::String(hint);
        }
        data
    }
}

impl From<ValidationError> for MetadataError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyProtocol => MetadataError::ProtocolRequired,
            ValidationError::UnknownChain(input) => MetadataError::UnknownChain(input),
            ValidationError::UnsupportedProtocol { protocol, supported } => {
                MetadataError::UnsupportedProtocol {
                    protocol,
                    supported,
                }
            }
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is missing
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    /// Environment variable has invalid value
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Convenience type alias for Results with FetchError
pub type FetchResult<T> = Result<T, FetchError>;

/// Convenience type alias for Results with MetadataError
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Convenience type alias for Results with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;
