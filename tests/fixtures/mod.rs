//! Shared test data for integration tests.

#![allow(dead_code)]

use crate::mocks::MockMetadataClient;
use metadata_mcp_server::cache::{RepositoryCache, TokenListCache};
use metadata_mcp_server::client::AsyncMetadataClient;
use metadata_mcp_server::domain::ProtocolRegistry;
use metadata_mcp_server::models::{
    EndpointState, MiniAppEndpoint, Repository, Template, TemplateCategory, TemplatesRepository,
};
use metadata_mcp_server::{Metrics, MetadataTools};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

pub const UNISWAP_URL: &str = "https://tokens.uniswap.org";
pub const PANGOLIN_URL: &str =
    "https://raw.githubusercontent.com/pangolindex/tokenlists/main/pangolin.tokenlist.json";
pub const TEMPLATE_BASE_URL: &str = "https://templates.test";

pub const REPOSITORY_TTL: Duration = Duration::from_secs(5 * 60);
pub const TOKEN_LIST_TTL: Duration = Duration::from_secs(30 * 60);
pub const TEMPLATE_TIMEOUT: Duration = Duration::from_secs(5);

pub fn token(name: &str, symbol: &str, address: &str, chain_id: u64) -> Value {
    json!({
        "name": name,
        "symbol": symbol,
        "address": address,
        "decimals": 18,
        "chainId": chain_id,
    })
}

/// Two mainnet tokens in reverse alphabetical order and one Avalanche token.
pub fn uniswap_entries() -> Vec<Value> {
    vec![
        token("Zeta", "ZET", "0x1111111111111111111111111111111111111111", 1),
        token("Alpha", "ALP", "0x2222222222222222222222222222222222222222", 1),
        token("Avax Coin", "AVC", "0x3333333333333333333333333333333333333333", 43114),
    ]
}

fn endpoint(host: &str, state: EndpointState, category: &str, protocol: &str) -> MiniAppEndpoint {
    MiniAppEndpoint {
        host: host.to_string(),
        state,
        category: category.to_string(),
        subcategory: None,
        verified_at: "2026-01-01T00:00:00Z".to_string(),
        protocol: protocol.to_string(),
        endpoint: format!("https://{}/api", host),
    }
}

pub fn template(id: &str, name: &str, protocol: &str, endpoint: &str) -> Template {
    Template {
        id: id.to_string(),
        name: name.to_string(),
        protocol: protocol.to_string(),
        endpoint: endpoint.to_string(),
    }
}

pub fn template_url(path: &str) -> String {
    format!("{}{}", TEMPLATE_BASE_URL, path)
}

pub fn sample_repository() -> Repository {
    Repository {
        last_updated: "2026-01-01T00:00:00Z".to_string(),
        version: "1.0.0".to_string(),
        mini_app_endpoints: vec![
            endpoint("zeta.swap.io", EndpointState::Trusted, "defi", "uniswap"),
            endpoint("alpha.swap.io", EndpointState::Trusted, "defi", "pangolin"),
            endpoint("nft.market.io", EndpointState::Pending, "nft", "opensea"),
        ],
        templates: vec![TemplatesRepository {
            base_url: format!("{}/", TEMPLATE_BASE_URL),
            categories: vec![
                TemplateCategory {
                    id: "swap".to_string(),
                    name: "Token Swap".to_string(),
                    templates: vec![
                        template("swap-one", "Swap One", "uniswap", "/swap/one.json"),
                        template("swap-two", "Swap Two", "uniswap", "/swap/two.json"),
                        template("swap-three", "Swap Three", "pangolin", "/swap/three.json"),
                    ],
                },
                TemplateCategory {
                    id: "staking".to_string(),
                    name: "Staking".to_string(),
                    templates: vec![template(
                        "stake-one",
                        "Stake One",
                        "pangolin",
                        "staking/one.json",
                    )],
                },
            ],
        }],
        ..Repository::default()
    }
}

/// Build the tool set over a mock client with default TTLs.
pub fn tools_with(mock: &MockMetadataClient) -> MetadataTools {
    let client = Arc::new(mock.clone()) as Arc<dyn AsyncMetadataClient>;
    let metrics = Metrics::new();
    let repository = RepositoryCache::new(client.clone(), REPOSITORY_TTL, metrics.clone());
    let tokens = TokenListCache::new(
        client.clone(),
        ProtocolRegistry::default(),
        TOKEN_LIST_TTL,
        metrics,
    );
    MetadataTools::new(repository, tokens, client, TEMPLATE_TIMEOUT)
}
