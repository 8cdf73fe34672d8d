//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! keystore file (+ passphrase)
//!     → wallet.rs (decrypt once, KeyMaterial)
//!
//! EthereumConfig
//!     → network.rs (network name → default RPC URI / registry address)
//!     → client.rs (dial the endpoint, RpcConnection)
//!     → binder.rs (TransactAuth + registry + ledger = ContractHandles)
//!     → contracts.rs (typed contract calls used by the ingress pipelines)
//! ```
//!
//! # Security Constraints
//! - Decrypted keys live only in memory and are never logged
//! - All RPC calls have configurable timeouts
//! - An unknown network on a required field is fatal, never a silent fallback

pub mod binder;
pub mod client;
pub mod contracts;
pub mod network;
pub mod types;
pub mod wallet;

pub use binder::{ContractBinder, ContractHandles, EthereumBinder, TransactAuth};
pub use client::RpcConnection;
pub use contracts::{Ledger, Registry};
pub use network::{Network, NetworkDefaults, Resolution, ResolvedEndpoint, StaticNetworkDefaults};
pub use types::{BlockchainError, BlockchainResult, ChainId};
pub use wallet::KeyMaterial;
