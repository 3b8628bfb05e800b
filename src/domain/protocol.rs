//! ProtocolName value object and the protocol → token-list URL table.

use super::errors::ValidationError;
use std::collections::BTreeMap;
use std::fmt;

/// Token-list URLs for the protocols served out of the box.
const DEFAULT_TOKEN_LISTS: &[(&str, &str)] = &[
    ("uniswap", "https://tokens.uniswap.org"),
    (
        "pangolin",
        "https://raw.githubusercontent.com/pangolindex/tokenlists/main/pangolin.tokenlist.json",
    ),
    (
        "traderjoe",
        "https://raw.githubusercontent.com/traderjoe-xyz/joe-tokenlists/main/mc.tokenlist.json",
    ),
    ("sushiswap", "https://token-list.sushi.com"),
    (
        "pancakeswap",
        "https://tokens.pancakeswap.finance/pancakeswap-extended.json",
    ),
];

/// A non-empty, lowercased protocol name.
///
/// # Example
///
/// ```
/// use metadata_mcp_server::domain::ProtocolName;
///
/// let name = ProtocolName::new(" Uniswap ").unwrap();
/// assert_eq!(name.as_str(), "uniswap");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtocolName(String);

impl ProtocolName {
    /// Create a new ProtocolName, trimming and lowercasing the input.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyProtocol` if the name is blank.
    pub fn new(name: impl AsRef<str>) -> Result<Self, ValidationError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyProtocol);
        }
        Ok(Self(name.to_lowercase()))
    }

    /// Get the protocol name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProtocolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static mapping from protocol name to its token-list URL.
#[derive(Debug, Clone)]
pub struct ProtocolRegistry {
    urls: BTreeMap<String, String>,
}

impl ProtocolRegistry {
    /// Build a registry from `(protocol, url)` pairs. Names are lowercased.
    pub fn new<I, P, U>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, U)>,
        P: Into<String>,
        U: Into<String>,
    {
        let urls = entries
            .into_iter()
            .map(|(protocol, url)| (protocol.into().to_lowercase(), url.into()))
            .collect();
        Self { urls }
    }

    /// Resolve a protocol to its token-list URL.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnsupportedProtocol` listing the known
    /// protocols when the name is not registered.
    pub fn resolve(&self, protocol: &ProtocolName) -> Result<&str, ValidationError> {
        self.urls
            .get(protocol.as_str())
            .map(String::as_str)
            .ok_or_else(|| ValidationError::UnsupportedProtocol {
                protocol: protocol.as_str().to_string(),
                supported: self.supported(),
            })
    }

    /// Names of all registered protocols, sorted.
    pub fn supported(&self) -> Vec<String> {
        self.urls.keys().cloned().collect()
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_LISTS.iter().copied())
    }
}
