//! Domain value objects and static lookup tables.
//!
//! This module contains type-safe wrappers for chain ids and protocol names,
//! together with the alias and token-list tables they resolve against. These
//! value objects validate at construction time so that an unknown chain or
//! blank protocol never reaches the caches.

pub mod chain;
pub mod errors;
pub mod protocol;

pub use chain::ChainId;
pub use errors::ValidationError;
pub use protocol::{ProtocolName, ProtocolRegistry};
