//! Peer overlay subsystem.
//!
//! # Data Flow
//! ```text
//! Construction (overlay.rs):
//!     local MultiAddress → table.rs (DiscoveryTable, fixed capacity)
//!                        → pool.rs (ConnPool, shared connection slots)
//!                        → transport.rs (SwarmClient + OrderbookClient over the pool)
//!                        → swarmer.rs (Swarmer)
//!
//! Bootstrap (swarmer.rs):
//!     seeds → ping each → store responders
//!           → query responders for peers → ping & store until full
//!     raced against a deadline; the loser is dropped
//! ```
//!
//! # Design Decisions
//! - Bootstrap failures are reported, never fatal
//! - The pool is the only place connection concurrency is bounded
//! - The wire protocol sits behind traits so the overlay runs without sockets in tests

pub mod client;
pub mod overlay;
pub mod pool;
pub mod swarmer;
pub mod table;
pub mod transport;

use std::time::Duration;

use thiserror::Error;

pub use client::{HttpSwarmClient, SwarmClient};
pub use overlay::Overlay;
pub use pool::ConnPool;
pub use swarmer::Swarmer;
pub use table::DiscoveryTable;
pub use transport::{HttpTransport, PeerTransport};

/// Errors that can occur in the overlay.
#[derive(Debug, Error)]
pub enum SwarmError {
    /// Discovery table or pool configured with zero capacity.
    #[error("{0} must be greater than zero")]
    InvalidCapacity(&'static str),

    /// Shared HTTP client could not be created.
    #[error("cannot create connection pool: {0}")]
    Pool(String),

    /// A request to a peer failed.
    #[error("request to {peer} failed: {reason}")]
    Transport { peer: String, reason: String },

    /// Some seeds could not be reached.
    #[error("{failed} of {total} bootstrap peers unreachable: {reasons}")]
    Bootstrap {
        failed: usize,
        total: usize,
        reasons: String,
    },

    /// Bootstrap was cancelled at its deadline.
    #[error("bootstrap did not finish within {0:?}")]
    Timeout(Duration),
}
