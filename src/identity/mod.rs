//! Node identity subsystem.
//!
//! # Data Flow
//! ```text
//! KeyMaterial (address) ─┐
//! PORT ──────────────────┼─→ resolver.rs → /ip4/<ip>/tcp/<port>/republic/<address>
//! IP-echo service ───────┘        │
//!                                 ▼
//!                          address.rs (parse & validate)
//! ```
//!
//! The resolved [`MultiAddress`] is the node's identity in the overlay. It is
//! computed once at startup and never changes afterwards.

pub mod address;
pub mod resolver;

use thiserror::Error;

pub use address::MultiAddress;
pub use resolver::{resolve_address, HttpIpLookup, IpLookup};

/// Errors raised while deriving the node identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The public IP could not be discovered.
    #[error("cannot discover public address: {0}")]
    NetworkDiscovery(String),

    /// A multi-address string could not be parsed.
    #[error("malformed multi-address: {0}")]
    AddressFormat(String),
}
