//! Token model and the normalization applied to raw token-list entries.

use crate::domain::chain::is_numeric;
use crate::error::{FetchError, FetchResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The all-zero address used by token lists to denote a chain's native asset.
pub const NATIVE_TOKEN_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// A validated, canonical token-list entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub address: String,
    pub decimals: u32,

    /// Always a decimal string, regardless of how upstream encoded it
    pub chain_id: String,

    #[serde(rename = "logoURI", skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub is_native: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<TokenPrice>,
}

/// Last known USD price of a token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPrice {
    pub usd: f64,
    pub last_updated: String,
}

/// Whether an address is the native-asset sentinel.
pub fn is_native_address(address: &str) -> bool {
    address.eq_ignore_ascii_case(NATIVE_TOKEN_ADDRESS)
}

impl TokenInfo {
    /// Build a canonical token from a raw token-list entry.
    ///
    /// Returns `None` when `address`, `symbol` or `name` is missing or empty,
    /// or when `decimals`/`chainId` is not numeric. Numbers may arrive as
    /// JSON numbers or numeric strings.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let address = non_empty_str(raw.get("address"))?;
        let symbol = non_empty_str(raw.get("symbol"))?;
        let name = non_empty_str(raw.get("name"))?;
        let decimals = numeric_string(raw.get("decimals"))?.parse::<u32>().ok()?;
        let chain_id = numeric_string(raw.get("chainId"))?;

        let logo_uri = raw
            .get("logoURI")
            .and_then(Value::as_str)
            .map(str::to_string);

        let tags = raw
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let price = raw
            .get("price")
            .and_then(|p| serde_json::from_value::<TokenPrice>(p.clone()).ok());

        Some(TokenInfo {
            is_native: is_native_address(&address),
            name,
            symbol,
            address,
            decimals,
            chain_id,
            logo_uri,
            tags,
            price,
        })
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn numeric_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => n.as_u64().map(|n| n.to_string()),
        Value::String(s) if is_numeric(s.trim()) => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Extract the raw entries from a token-list document.
///
/// Accepts a bare array or an object with a `tokens` array. Anything else,
/// including an empty list, is an error.
pub fn extract_token_entries(document: Value) -> FetchResult<Vec<Value>> {
    let entries = match document {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("tokens") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(FetchError::InvalidTokenList(
                    "object has no `tokens` array".to_string(),
                ))
            }
        },
        _ => {
            return Err(FetchError::InvalidTokenList(
                "expected an array or an object with a `tokens` array".to_string(),
            ))
        }
    };

    if entries.is_empty() {
        return Err(FetchError::InvalidTokenList("list is empty".to_string()));
    }
    Ok(entries)
}

/// Normalize raw entries, silently dropping malformed ones.
pub fn normalize_tokens(entries: &[Value]) -> Vec<TokenInfo> {
    let tokens: Vec<TokenInfo> = entries.iter().filter_map(TokenInfo::from_raw).collect();
    let dropped = entries.len() - tokens.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = tokens.len(), "Dropped malformed token entries");
    }
    tokens
}
