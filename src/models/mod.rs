//! Data models for the repository document and token lists.

pub mod repository;
pub mod token;

pub use repository::{
    EndpointState, IntegratorDomain, MaliciousDomain, MiniAppEndpoint, Repository, Template,
    TemplateCategory, TemplatesRepository,
};
pub use token::{TokenInfo, TokenPrice, NATIVE_TOKEN_ADDRESS};
