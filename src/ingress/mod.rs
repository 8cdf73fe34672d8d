//! Order ingestion.
//!
//! # Data Flow
//! ```text
//! HTTP POST /orders ──► Ingress::open_order ──► order queue
//!                                                   │
//!                       open_order_process ◄────────┘
//!                         │ Ledger::open_order
//!                         ▼
//!                      fragment queue ◄── HTTP POST /orders/fragments
//!                         │
//!                       open_order_fragments_process
//!                         │ registry check → Swarmer::query → OrderbookClient
//!                         ▼
//!                      darknode
//! ```
//!
//! Each process reports failures on its own [`ErrorStream`]. A stream closes
//! once its process has stopped.

pub mod orderbook;
pub mod pipeline;
pub mod supervisor;
pub mod types;

use alloy::primitives::{Address, B256};
use thiserror::Error;

pub use orderbook::{HttpOrderbookClient, OrderbookClient};
pub use pipeline::Ingress;
pub use supervisor::{drain_errors, ErrorStream, IngestionStreams, IngestionSupervisor};
pub use types::{FragmentRoute, OpenOrderRequest, OrderFragment, OrderId, Pipeline};

/// Errors raised while accepting or processing orders.
#[derive(Debug, Error)]
pub enum IngressError {
    /// Request failed validation.
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// Intake queue is full.
    #[error("ingress is busy")]
    Busy,

    /// Processing has stopped.
    #[error("ingress has stopped")]
    Stopped,

    /// Ledger rejected or failed to record the order.
    #[error("cannot open order {order_id} on ledger: {reason}")]
    Ledger { order_id: OrderId, reason: String },

    /// Registry lookup failed.
    #[error("cannot read darknode registry: {0}")]
    Registry(String),

    /// Fragment addressed to a node that is not registered.
    #[error("darknode {0} is not registered")]
    UnregisteredDarknode(Address),

    /// Darknode could not be located in the overlay.
    #[error("no route to darknode {0}")]
    UnknownDarknode(Address),

    /// Delivery to the darknode failed.
    #[error("cannot deliver fragment {fragment} to {darknode}: {reason}")]
    Delivery {
        darknode: Address,
        fragment: B256,
        reason: String,
    },
}
