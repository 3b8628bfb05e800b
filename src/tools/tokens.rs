//! `getProtocolTokens`: token lists by protocol and chain.

use crate::cache::TokenListCache;
use crate::domain::ChainId;
use crate::error::{MetadataError, MetadataResult};
use crate::models::TokenInfo;
use crate::tools::{help, validate_limit, ToolOutput};
use schemars::JsonSchema;
use serde::Deserialize;
use std::str::FromStr;

/// Default page size when `limit` is omitted.
pub const DEFAULT_TOKEN_LIMIT: usize = 100;

/// A chain selector given either as a number or as a string (id or alias).
#[derive(Debug, Clone, Deserialize, JsonSchema, PartialEq)]
#[serde(untagged)]
pub enum ChainSelector {
    Id(u64),
    Name(String),
}

impl ChainSelector {
    pub fn as_selector(&self) -> String {
        match self {
            ChainSelector::Id(id) => id.to_string(),
            ChainSelector::Name(name) => name.clone(),
        }
    }
}

/// Parameters for `getProtocolTokens`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetProtocolTokensParams {
    /// Protocol whose token list to read, e.g. "uniswap"
    #[serde(default)]
    pub protocol: Option<String>,

    /// Chain id (number or numeric string) or alias such as "avalanche"
    #[serde(default)]
    pub chain_id: Option<ChainSelector>,

    /// Case-insensitive substring matched against name and symbol
    #[serde(default)]
    pub search: Option<String>,

    /// Only tokens carrying every one of these tags
    #[serde(default)]
    pub tags: Option<Vec<String>>,

    /// Sort order: "name", "symbol" or "none" (upstream order)
    #[serde(default)]
    pub sort: Option<String>,

    /// Maximum tokens to return (default 100, max 1000)
    #[serde(default)]
    pub limit: Option<usize>,

    /// Tokens to skip before returning results (default 0)
    #[serde(default)]
    pub offset: Option<usize>,

    /// Return usage text instead of querying
    #[serde(default)]
    pub help: Option<bool>,
}

/// Sort orders accepted by `getProtocolTokens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenSort {
    #[default]
    None,
    Name,
    Symbol,
}

impl FromStr for TokenSort {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(TokenSort::None),
            "name" => Ok(TokenSort::Name),
            "symbol" => Ok(TokenSort::Symbol),
            other => Err(MetadataError::InvalidArgument(format!(
                "sort must be one of: name, symbol, none (got '{}')",
                other
            ))),
        }
    }
}

/// Filter, sort and paginate a cached list. Returns the total before paging.
pub fn select_tokens(
    tokens: &[TokenInfo],
    search: Option<&str>,
    tags: &[String],
    sort: TokenSort,
    offset: usize,
    limit: usize,
) -> (usize, Vec<TokenInfo>) {
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut selected: Vec<&TokenInfo> = tokens
        .iter()
        .filter(|token| match &needle {
            Some(needle) => {
                token.name.to_lowercase().contains(needle)
                    || token.symbol.to_lowercase().contains(needle)
            }
            None => true,
        })
        .filter(|token| {
            tags.iter()
                .all(|tag| token.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
        })
        .collect();

    match sort {
        TokenSort::None => {}
        TokenSort::Name => selected.sort_by_key(|t| t.name.to_lowercase()),
        TokenSort::Symbol => selected.sort_by_key(|t| t.symbol.to_lowercase()),
    }

    let total = selected.len();
    let page = selected
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();
    (total, page)
}

/// Run `getProtocolTokens` against the token-list cache.
pub async fn get_protocol_tokens(
    cache: &TokenListCache,
    params: GetProtocolTokensParams,
) -> MetadataResult<ToolOutput> {
    if params.help.unwrap_or(false) {
        return Ok(ToolOutput::Text(help::protocol_tokens(
            &cache.supported_protocols(),
        )));
    }

    let sort = match params.sort.as_deref() {
        Some(sort) => sort.parse::<TokenSort>()?,
        None => TokenSort::None,
    };
    let limit = validate_limit(params.limit, DEFAULT_TOKEN_LIMIT)?;
    let offset = params.offset.unwrap_or(0);

    let protocol = params.protocol.unwrap_or_default();
    let selector = params.chain_id.as_ref().map(ChainSelector::as_selector);

    let tokens = cache
        .get_tokens_by_protocol(&protocol, selector.as_deref())
        .await?;

    let tags = params.tags.unwrap_or_default();
    let (total, page) = select_tokens(&tokens, params.search.as_deref(), &tags, sort, offset, limit);

    // Already validated by the cache lookup above
    let chain_id = selector
        .as_deref()
        .and_then(|s| ChainId::normalize(s).ok())
        .map(ChainId::into_inner);

    tracing::debug!(
        protocol = %protocol,
        chain_id = ?chain_id,
        total,
        returned = page.len(),
        "getProtocolTokens"
    );

    Ok(ToolOutput::Json(serde_json::json!({
        "protocol": protocol.trim().to_lowercase(),
        "chainId": chain_id,
        "total": total,
        "count": page.len(),
        "offset": offset,
        "tokens": page,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(name: &str, symbol: &str, tags: &[&str]) -> TokenInfo {
        TokenInfo {
            name: name.to_string(),
            symbol: symbol.to_string(),
            address: format!("0x{}", name.to_lowercase()),
            decimals: 18,
            chain_id: "1".to_string(),
            logo_uri: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            is_native: false,
            price: None,
        }
    }

    #[test]
    fn test_chain_selector_accepts_number_and_string() {
        let params: GetProtocolTokensParams =
            serde_json::from_value(serde_json::json!({"protocol": "uniswap", "chainId": 1})).unwrap();
        assert_eq!(params.chain_id, Some(ChainSelector::Id(1)));

        let params: GetProtocolTokensParams =
            serde_json::from_value(serde_json::json!({"chainId": "avax"})).unwrap();
        assert_eq!(params.chain_id.unwrap().as_selector(), "avax");
    }

    #[test]
    fn test_sort_then_truncate() {
        let tokens = vec![token("Zeta", "ZET", &[]), token("Alpha", "ALP", &[])];
        let (total, page) = select_tokens(&tokens, None, &[], TokenSort::Name, 0, 1);
        assert_eq!(total, 2);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Alpha");
    }

    #[test]
    fn test_search_and_tags() {
        let tokens = vec![
            token("USD Coin", "USDC", &["stablecoin"]),
            token("Tether", "USDT", &["stablecoin"]),
            token("Wrapped Ether", "WETH", &[]),
        ];

        let (total, _) = select_tokens(&tokens, Some("usd"), &[], TokenSort::None, 0, 10);
        assert_eq!(total, 2);

        let (total, page) = select_tokens(
            &tokens,
            Some("tether"),
            &["StableCoin".to_string()],
            TokenSort::None,
            0,
            10,
        );
        assert_eq!(total, 1);
        assert_eq!(page[0].symbol, "USDT");
    }

    #[test]
    fn test_offset_past_end() {
        let tokens = vec![token("A", "A", &[]), token("B", "B", &[])];
        let (total, page) = select_tokens(&tokens, None, &[], TokenSort::Symbol, 5, 10);
        assert_eq!(total, 2);
        assert!(page.is_empty());
    }

    #[test]
    fn test_invalid_sort() {
        assert!(matches!(
            "price".parse::<TokenSort>(),
            Err(MetadataError::InvalidArgument(_))
        ));
        assert_eq!("NAME".parse::<TokenSort>().unwrap(), TokenSort::Name);
    }
}
