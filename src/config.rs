//! Configuration management for the Metadata MCP Server.
//!
//! This module handles loading and validating configuration from environment variables.
//! It avoids polluting stdout (which the stdio transport uses for communication) by
//! loading the .env file silently if present.

use crate::error::{ConfigError, ConfigResult};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default location of the repository document.
pub const DEFAULT_REPOSITORY_URL: &str =
    "https://raw.githubusercontent.com/metadata-registry/repository/main/repository.json";

/// Upper bound for the session timeout and cache TTLs (one week).
pub const MAX_MINUTES: u64 = 7 * 24 * 60;

/// Upper bound for upstream fetch timeouts.
pub const MAX_FETCH_TIMEOUT_SECS: u64 = 600;

/// Which transport the server listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Streamable HTTP with bearer auth and sessions
    Http,
    /// Single client over stdin/stdout
    Stdio,
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(TransportMode::Http),
            "stdio" => Ok(TransportMode::Stdio),
            other => Err(format!("Must be 'http' or 'stdio', got: {}", other)),
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Http => f.write_str("http"),
            TransportMode::Stdio => f.write_str("stdio"),
        }
    }
}

/// Configuration for the Metadata MCP Server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Transport to serve on (default: http)
    pub transport: TransportMode,

    /// Bind address for the HTTP transport (default: 127.0.0.1)
    pub host: String,

    /// Port for the HTTP transport (default: 3000)
    pub port: u16,

    /// Bearer token required on /mcp requests (required for http)
    pub auth_token: Option<String>,

    /// URL of the repository document
    pub repository_url: String,

    /// Session inactivity timeout in minutes (default: 30)
    pub session_timeout_minutes: u64,

    /// Repository cache TTL in minutes (default: 5)
    pub repository_cache_ttl_minutes: u64,

    /// Token-list cache TTL in minutes (default: 30)
    pub token_list_cache_ttl_minutes: u64,

    /// Repository fetch timeout in seconds (default: 10)
    pub repository_fetch_timeout: u64,

    /// Token-list fetch timeout in seconds (default: 10)
    pub token_list_fetch_timeout: u64,

    /// Template metadata fetch timeout in seconds (default: 5)
    pub template_fetch_timeout: u64,

    /// Log level (default: "info")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `MCP_AUTH_TOKEN`: bearer token, when `MCP_TRANSPORT` is `http`
    ///
    /// Optional environment variables:
    /// - `MCP_TRANSPORT`: `http` or `stdio` (default: http)
    /// - `HOST` / `PORT`: HTTP bind address (default: 127.0.0.1:3000)
    /// - `METADATA_REPOSITORY_URL`: repository document URL
    /// - `SESSION_TIMEOUT_MINUTES`: session inactivity timeout (default: 30)
    /// - `REPOSITORY_CACHE_TTL_MINUTES`: repository cache TTL (default: 5)
    /// - `TOKEN_LIST_CACHE_TTL_MINUTES`: token-list cache TTL (default: 30)
    /// - `REPOSITORY_FETCH_TIMEOUT`: seconds (default: 10)
    /// - `TOKEN_LIST_FETCH_TIMEOUT`: seconds (default: 10)
    /// - `TEMPLATE_FETCH_TIMEOUT`: seconds (default: 5)
    /// - `LOG_LEVEL`: Logging level (default: "info")
    pub fn from_env() -> ConfigResult<Self> {
        // Try to load .env file if it exists (but don't fail if it doesn't)
        // We use dotenvy::dotenv() which doesn't print to stdout
        let _ = dotenvy::dotenv();

        let transport = match env::var("MCP_TRANSPORT") {
            Ok(val) => val
                .parse::<TransportMode>()
                .map_err(|reason| ConfigError::InvalidValue {
                    var: "MCP_TRANSPORT".to_string(),
                    reason,
                })?,
            Err(_) => TransportMode::Http,
        };

        let auth_token = match env::var("MCP_AUTH_TOKEN") {
            Ok(token) if token.trim().is_empty() => {
                return Err(ConfigError::InvalidValue {
                    var: "MCP_AUTH_TOKEN".to_string(),
                    reason: "Cannot be empty".to_string(),
                })
            }
            Ok(token) => Some(token),
            Err(_) => None,
        };

        if transport == TransportMode::Http && auth_token.is_none() {
            return Err(ConfigError::MissingVar("MCP_AUTH_TOKEN".to_string()));
        }

        let repository_url = env::var("METADATA_REPOSITORY_URL")
            .unwrap_or_else(|_| DEFAULT_REPOSITORY_URL.to_string());

        // Validate repository URL format
        if !repository_url.starts_with("http://") && !repository_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                var: "METADATA_REPOSITORY_URL".to_string(),
                reason: "Must start with http:// or https://".to_string(),
            });
        }

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = Self::parse_env_u16("PORT", 3000)?;

        let session_timeout_minutes =
            Self::parse_env_bounded("SESSION_TIMEOUT_MINUTES", 30, 1, MAX_MINUTES)?;
        let repository_cache_ttl_minutes =
            Self::parse_env_bounded("REPOSITORY_CACHE_TTL_MINUTES", 5, 0, MAX_MINUTES)?;
        let token_list_cache_ttl_minutes =
            Self::parse_env_bounded("TOKEN_LIST_CACHE_TTL_MINUTES", 30, 0, MAX_MINUTES)?;
        let repository_fetch_timeout =
            Self::parse_env_bounded("REPOSITORY_FETCH_TIMEOUT", 10, 1, MAX_FETCH_TIMEOUT_SECS)?;
        let token_list_fetch_timeout =
            Self::parse_env_bounded("TOKEN_LIST_FETCH_TIMEOUT", 10, 1, MAX_FETCH_TIMEOUT_SECS)?;
        let template_fetch_timeout =
            Self::parse_env_bounded("TEMPLATE_FETCH_TIMEOUT", 5, 1, MAX_FETCH_TIMEOUT_SECS)?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            transport,
            host,
            port,
            auth_token,
            repository_url,
            session_timeout_minutes,
            repository_cache_ttl_minutes,
            token_list_cache_ttl_minutes,
            repository_fetch_timeout,
            token_list_fetch_timeout,
            template_fetch_timeout,
            log_level,
        })
    }

    /// Session inactivity timeout as a Duration.
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_minutes.saturating_mul(60))
    }

    /// Repository cache TTL as a Duration.
    pub fn repository_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.repository_cache_ttl_minutes.saturating_mul(60))
    }

    /// Token-list cache TTL as a Duration.
    pub fn token_list_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.token_list_cache_ttl_minutes.saturating_mul(60))
    }

    /// HTTP bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parse an environment variable as u64 with a default value.
    fn parse_env_u64(var_name: &str, default: u64) -> ConfigResult<u64> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as a u64 within `min..=max`.
    fn parse_env_bounded(var_name: &str, default: u64, min: u64, max: u64) -> ConfigResult<u64> {
        let value = Self::parse_env_u64(var_name, default)?;
        if value < min {
            return Err(ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be at least {}, got: {}", min, value),
            });
        }
        if value > max {
            return Err(ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be at most {}, got: {}", max, value),
            });
        }
        Ok(value)
    }

    /// Parse an environment variable as u16 with a default value.
    fn parse_env_u16(var_name: &str, default: u16) -> ConfigResult<u16> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a number between 0-65535, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            transport: TransportMode::Http,
            host: "127.0.0.1".to_string(),
            port: 3000,
            auth_token: None,
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            session_timeout_minutes: 30,
            repository_cache_ttl_minutes: 5,
            token_list_cache_ttl_minutes: 30,
            repository_fetch_timeout: 10,
            token_list_fetch_timeout: 10,
            template_fetch_timeout: 5,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const ALL_VARS: &[&str] = &[
        "MCP_TRANSPORT",
        "MCP_AUTH_TOKEN",
        "METADATA_REPOSITORY_URL",
        "HOST",
        "PORT",
        "SESSION_TIMEOUT_MINUTES",
        "REPOSITORY_CACHE_TTL_MINUTES",
        "TOKEN_LIST_CACHE_TTL_MINUTES",
        "REPOSITORY_FETCH_TIMEOUT",
        "TOKEN_LIST_FETCH_TIMEOUT",
        "TEMPLATE_FETCH_TIMEOUT",
    ];

    // Helper to set and unset env vars for testing
    struct EnvGuard {
        vars: Vec<String>,
    }

    impl EnvGuard {
        fn new() -> Self {
            // Start every test from a clean slate
            for var in ALL_VARS {
                env::remove_var(var);
            }
            EnvGuard { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            env::set_var(key, value);
            self.vars.push(key.to_string());
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for var in &self.vars {
                env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.session_timeout(), Duration::from_secs(30 * 60));
        assert_eq!(config.repository_cache_ttl(), Duration::from_secs(5 * 60));
        assert_eq!(config.token_list_cache_ttl(), Duration::from_secs(30 * 60));
        assert_eq!(config.template_fetch_timeout, 5);
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    #[serial]
    fn test_config_http_requires_auth_token() {
        let mut guard = EnvGuard::new();
        guard.set("MCP_TRANSPORT", "http");

        let result = Config::from_env();
        match result {
            Err(ConfigError::MissingVar(var)) => assert_eq!(var, "MCP_AUTH_TOKEN"),
            other => panic!("Expected MissingVar error, got: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_config_stdio_without_auth_token() {
        let mut guard = EnvGuard::new();
        guard.set("MCP_TRANSPORT", "stdio");

        let config = Config::from_env().unwrap();
        assert_eq!(config.transport, TransportMode::Stdio);
        assert!(config.auth_token.is_none());
    }

    #[test]
    #[serial]
    fn test_config_empty_auth_token() {
        let mut guard = EnvGuard::new();
        guard.set("MCP_AUTH_TOKEN", "   ");

        let result = Config::from_env();
        assert!(result.is_err());
        if let Err(ConfigError::InvalidValue { var, .. }) = result {
            assert_eq!(var, "MCP_AUTH_TOKEN");
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_repository_url() {
        let mut guard = EnvGuard::new();
        guard.set("MCP_AUTH_TOKEN", "secret");
        guard.set("METADATA_REPOSITORY_URL", "not-a-url");

        let result = Config::from_env();
        assert!(result.is_err());
        if let Err(ConfigError::InvalidValue { var, .. }) = result {
            assert_eq!(var, "METADATA_REPOSITORY_URL");
        }
    }

    #[test]
    #[serial]
    fn test_config_from_env_valid() {
        let mut guard = EnvGuard::new();
        guard.set("MCP_AUTH_TOKEN", "secret-123");
        guard.set("PORT", "8080");
        guard.set("SESSION_TIMEOUT_MINUTES", "10");
        guard.set("TOKEN_LIST_CACHE_TTL_MINUTES", "60");

        let config = Config::from_env().unwrap();
        assert_eq!(config.transport, TransportMode::Http);
        assert_eq!(config.auth_token.as_deref(), Some("secret-123"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.session_timeout_minutes, 10);
        assert_eq!(config.token_list_cache_ttl_minutes, 60);
        assert_eq!(config.repository_cache_ttl_minutes, 5);
    }

    #[test]
    #[serial]
    fn test_config_zero_timeout_rejected() {
        let mut guard = EnvGuard::new();
        guard.set("MCP_AUTH_TOKEN", "secret");
        guard.set("TEMPLATE_FETCH_TIMEOUT", "0");

        match Config::from_env() {
            Err(ConfigError::InvalidValue { var, .. }) => {
                assert_eq!(var, "TEMPLATE_FETCH_TIMEOUT")
            }
            other => panic!("Expected InvalidValue error, got: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_config_huge_durations_rejected() {
        for var in [
            "SESSION_TIMEOUT_MINUTES",
            "REPOSITORY_CACHE_TTL_MINUTES",
            "TOKEN_LIST_CACHE_TTL_MINUTES",
        ] {
            let mut guard = EnvGuard::new();
            guard.set("MCP_AUTH_TOKEN", "secret");
            guard.set(var, "18446744073709551615");

            match Config::from_env() {
                Err(ConfigError::InvalidValue { var: rejected, reason }) => {
                    assert_eq!(rejected, var);
                    assert!(reason.contains("at most"));
                }
                other => panic!("Expected InvalidValue error for {}, got: {:?}", var, other),
            }
        }

        let mut guard = EnvGuard::new();
        guard.set("MCP_AUTH_TOKEN", "secret");
        guard.set("SESSION_TIMEOUT_MINUTES", &MAX_MINUTES.to_string());
        let config = Config::from_env().unwrap();
        assert_eq!(config.session_timeout(), Duration::from_secs(MAX_MINUTES * 60));
    }

    #[test]
    fn test_duration_accessors_saturate() {
        let config = Config {
            session_timeout_minutes: u64::MAX,
            ..Config::default()
        };
        assert_eq!(config.session_timeout(), Duration::from_secs(u64::MAX));
    }

    #[test]
    #[serial]
    fn test_invalid_transport() {
        let mut guard = EnvGuard::new();
        guard.set("MCP_TRANSPORT", "carrier-pigeon");

        match Config::from_env() {
            Err(ConfigError::InvalidValue { var, .. }) => assert_eq!(var, "MCP_TRANSPORT"),
            other => panic!("Expected InvalidValue error, got: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_parse_env_u64() {
        let mut guard = EnvGuard::new();
        guard.set("TEST_U64", "42");

        let result = Config::parse_env_u64("TEST_U64", 10);
        assert_eq!(result.unwrap(), 42);

        let result = Config::parse_env_u64("NONEXISTENT", 10);
        assert_eq!(result.unwrap(), 10);
    }

    #[test]
    #[serial]
    fn test_parse_env_u64_invalid() {
        let mut guard = EnvGuard::new();
        guard.set("TEST_U64_INVALID", "not-a-number");

        let result = Config::parse_env_u64("TEST_U64_INVALID", 10);
        assert!(result.is_err());
    }
}
