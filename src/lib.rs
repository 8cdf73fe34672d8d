//! Ingress node library.
//!
//! Startup orchestration for a peer that accepts orders, anchors them on
//! chain and distributes their fragments to darknodes over a peer overlay.

pub mod blockchain;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod ingress;
pub mod lifecycle;
pub mod observability;
pub mod swarm;

pub use config::{NodeConfig, NodeEnv};
pub use error::NodeError;
pub use http::HttpServer;
pub use lifecycle::{Dependencies, Orchestrator, RunningNode, Shutdown, Stage};
