//! Domain validation errors.

use std::fmt;

/// Errors that can occur during domain value object validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The protocol name is empty or blank.
    EmptyProtocol,

    /// The chain selector is neither numeric nor a known alias.
    UnknownChain(String),

    /// No token list is registered for the protocol.
    UnsupportedProtocol {
        protocol: String,
        supported: Vec<String>,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyProtocol => write!(f, "Protocol cannot be empty"),
            Self::UnknownChain(input) => write!(f, "Unknown chain: {}", input),
            Self::UnsupportedProtocol { protocol, .. } => {
                write!(f, "Unsupported protocol: {}", protocol)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
