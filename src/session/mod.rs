//! Session tracking for the HTTP transport.
//!
//! Maps server-minted session ids to long-lived connection handles and
//! reclaims handles that go idle.

pub mod registry;

pub use registry::{ConnectionHandle, SessionRegistry};
