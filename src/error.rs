//! Node-level error taxonomy.
//!
//! Module errors convert into [`NodeError`]; [`NodeError::is_fatal`]
//! decides whether startup can continue.

use thiserror::Error;

use crate::blockchain::BlockchainError;
use crate::config::ConfigError;
use crate::identity::IdentityError;
use crate::ingress::IngressError;
use crate::swarm::SwarmError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("cannot load config: {0}")]
    ConfigLoad(#[from] ConfigError),

    #[error("cannot load keystore: {0}")]
    KeystoreLoad(String),

    #[error("cannot decrypt keystore: {0}")]
    KeystoreDecrypt(String),

    #[error("cannot discover public address: {0}")]
    NetworkDiscovery(String),

    #[error("malformed multi-address: {0}")]
    AddressFormat(String),

    #[error("cannot connect to {0}: unsupported")]
    UnsupportedNetwork(String),

    #[error("no default contract address on {0}")]
    NoDefaultAddress(String),

    #[error("cannot connect to ethereum: {0}")]
    Connection(String),

    #[error("cannot bind to {contract}: {reason}")]
    ContractBind { contract: &'static str, reason: String },

    #[error("cannot construct overlay: {0}")]
    OverlayConstruction(SwarmError),

    #[error("error bootstrapping: {0}")]
    OverlayBootstrap(SwarmError),

    #[error("error processing: {0}")]
    IngestionProcessing(#[from] IngressError),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

impl NodeError {
    /// Whether this error must abort startup.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            NodeError::OverlayBootstrap(_) | NodeError::IngestionProcessing(_)
        )
    }
}

impl From<IdentityError> for NodeError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NetworkDiscovery(msg) => NodeError::NetworkDiscovery(msg),
            IdentityError::AddressFormat(msg) => NodeError::AddressFormat(msg),
        }
    }
}

impl From<BlockchainError> for NodeError {
    fn from(err: BlockchainError) -> Self {
        match err {
            BlockchainError::Keystore(msg) => NodeError::KeystoreLoad(msg),
            BlockchainError::KeystoreDecrypt(msg) => NodeError::KeystoreDecrypt(msg),
            BlockchainError::UnsupportedNetwork(network) => NodeError::UnsupportedNetwork(network),
            BlockchainError::NoDefaultAddress(network) => NodeError::NoDefaultAddress(network),
            BlockchainError::Connection(msg) => NodeError::Connection(msg),
            BlockchainError::ContractBind { contract, reason } => NodeError::ContractBind { contract, reason },
            other @ (BlockchainError::Rpc(_) | BlockchainError::Timeout(_)) => NodeError::ContractBind {
                contract: "contracts",
                reason: other.to_string(),
            },
        }
    }
}
