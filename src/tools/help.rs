//! Usage text returned when a tool is called with `help: true`.

use crate::domain::chain::known_aliases;
use crate::models::EndpointState;

pub fn protocol_tokens(supported: &[String]) -> String {
    format!(
        "getProtocolTokens - list the tokens of a protocol's token list\n\
         \n\
         Parameters:\n\
         \x20 protocol  (required) one of: {}\n\
         \x20 chainId   numeric chain id or alias ({})\n\
         \x20 search    case-insensitive match on name or symbol\n\
         \x20 tags      only tokens carrying all of these tags\n\
         \x20 sort      name | symbol | none\n\
         \x20 limit     page size, 1-1000 (default 100)\n\
         \x20 offset    tokens to skip (default 0)\n\
         \n\
         Example: {{\"protocol\": \"uniswap\", \"chainId\": \"avalanche\", \"search\": \"usd\"}}",
        supported.join(", "),
        known_aliases().join(", ")
    )
}

pub fn mini_app_endpoints() -> String {
    let states: Vec<&str> = EndpointState::ALL.iter().map(EndpointState::as_str).collect();
    format!(
        "getMiniAppEndpoints - list mini-app endpoints from the metadata repository\n\
         \n\
         Parameters:\n\
         \x20 state     one of: {}\n\
         \x20 category  exact category, case-insensitive\n\
         \x20 protocol  exact protocol, case-insensitive\n\
         \x20 host      substring of the endpoint host\n\
         \x20 limit     maximum results, 1-1000\n\
         \n\
         Example: {{\"state\": \"trusted\", \"category\": \"defi\"}}",
        states.join(", ")
    )
}

pub fn metadata_of_template() -> String {
    "getMetadataOfTemplate - fetch metadata documents for matching templates\n\
     \n\
     Parameters (at least one required):\n\
     \x20 templateId    exact template id\n\
     \x20 templateName  substring of the template name, case-insensitive\n\
     \x20 category      category id or name, case-insensitive\n\
     \x20 protocol      exact protocol, case-insensitive\n\
     \n\
     Each matching template is fetched independently. Failures are listed\n\
     under \"errors\" and do not affect the other results.\n\
     \n\
     Example: {\"category\": \"swap\", \"protocol\": \"uniswap\"}"
        .to_string()
}
