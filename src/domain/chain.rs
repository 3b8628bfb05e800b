//! ChainId value object and the chain alias table.

use super::errors::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

static NUMERIC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("Failed to compile numeric regex"));

/// Chain-name aliases and the canonical chain id each resolves to.
///
/// Lookups are case-insensitive; keys here are lowercase.
const CHAIN_ALIASES: &[(&str, &str)] = &[
    ("ethereum", "1"),
    ("eth", "1"),
    ("mainnet", "1"),
    ("optimism", "10"),
    ("op", "10"),
    ("bsc", "56"),
    ("bnb", "56"),
    ("binance", "56"),
    ("polygon", "137"),
    ("matic", "137"),
    ("fantom", "250"),
    ("ftm", "250"),
    ("base", "8453"),
    ("arbitrum", "42161"),
    ("arb", "42161"),
    ("avalanche", "43114"),
    ("avax", "43114"),
    ("c-chain", "43114"),
    ("fuji", "43113"),
    ("avalanche-fuji", "43113"),
    ("sepolia", "11155111"),
];

/// All alias names accepted by [`ChainId::normalize`].
pub fn known_aliases() -> Vec<&'static str> {
    CHAIN_ALIASES.iter().map(|(alias, _)| *alias).collect()
}

/// A canonical, decimal-string chain id.
///
/// # Example
///
/// ```
/// use metadata_mcp_server::domain::ChainId;
///
/// assert_eq!(ChainId::normalize("AVAX").unwrap().as_str(), "43114");
/// assert_eq!(ChainId::normalize("43114").unwrap().as_str(), "43114");
/// assert!(ChainId::normalize("unknownchain").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainId(String);

impl ChainId {
    /// Resolve a chain selector to its canonical id.
    ///
    /// A purely numeric selector passes through unchanged. Anything else is
    /// looked up case-insensitively in the alias table.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownChain` carrying the input verbatim if
    /// the selector is not numeric and not a known alias.
    pub fn normalize(selector: &str) -> Result<Self, ValidationError> {
        let trimmed = selector.trim();
        if NUMERIC_REGEX.is_match(trimmed) {
            return Ok(Self(trimmed.to_string()));
        }

        let lowered = trimmed.to_lowercase();
        CHAIN_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map(|(_, id)| Self((*id).to_string()))
            .ok_or_else(|| ValidationError::UnknownChain(selector.to_string()))
    }

    /// Get the chain id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the underlying String.
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Whether a string consists solely of ASCII digits.
pub fn is_numeric(value: &str) -> bool {
    NUMERIC_REGEX.is_match(value)
}

impl Serialize for ChainId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
