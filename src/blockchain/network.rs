//! Named network environments and their default endpoints.
//!
//! Defaults are looked up through [`NetworkDefaults`] rather than read from a
//! hidden table, so tests and alternate deployments can substitute their own.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{address, Address};
use url::Url;

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::EthereumConfig;

/// Shared default endpoint of the public test networks.
pub const DEFAULT_KOVAN_URI: &str = "https://kovan.infura.io";
/// Default endpoint of a developer's local chain.
pub const DEFAULT_LOCAL_URI: &str = "http://localhost:8545";

pub const TESTNET_REGISTRY: Address = address!("5bf19a6ea8631bb722ade58e0d2c5813740c88fd");
pub const STAGING_REGISTRY: Address = address!("b6A95aED1588bE477981dcdEacd13776570ecB3D");
pub const NIGHTLY_REGISTRY: Address = address!("cf2F6b4b698Cd6a6B3eb1d874a939742d15f8e7E");

/// Outcome of a default lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Resolved(T),
    Unsupported,
}

/// Default values per named network.
pub trait NetworkDefaults: Send + Sync {
    fn rpc_uri(&self, network: &str) -> Resolution<String>;
    fn registry_address(&self, network: &str) -> Resolution<Address>;
}

/// Networks known to [`StaticNetworkDefaults`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Testnet,
    Staging,
    Nightly,
    Local,
}

impl FromStr for Network {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" | "test" => Ok(Network::Testnet),
            "staging" | "falcon" => Ok(Network::Staging),
            "nightly" => Ok(Network::Nightly),
            "local" => Ok(Network::Local),
            _ => Err(BlockchainError::UnsupportedNetwork(s.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Testnet => "testnet",
            Network::Staging => "staging",
            Network::Nightly => "nightly",
            Network::Local => "local",
        };
        f.write_str(name)
    }
}

/// The deployed network table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticNetworkDefaults;

impl NetworkDefaults for StaticNetworkDefaults {
    fn rpc_uri(&self, network: &str) -> Resolution<String> {
        match network.parse::<Network>() {
            Ok(Network::Testnet | Network::Staging | Network::Nightly) => {
                Resolution::Resolved(DEFAULT_KOVAN_URI.to_string())
            }
            Ok(Network::Local) => Resolution::Resolved(DEFAULT_LOCAL_URI.to_string()),
            Err(_) => Resolution::Unsupported,
        }
    }

    fn registry_address(&self, network: &str) -> Resolution<Address> {
        match network.parse::<Network>() {
            Ok(Network::Testnet) => Resolution::Resolved(TESTNET_REGISTRY),
            Ok(Network::Staging) => Resolution::Resolved(STAGING_REGISTRY),
            Ok(Network::Nightly) => Resolution::Resolved(NIGHTLY_REGISTRY),
            Ok(Network::Local) | Err(_) => Resolution::Unsupported,
        }
    }
}

/// Where to dial and which registry to bind, after defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub network: String,
    pub uri: Url,
    pub registry: Address,
}

/// Apply network defaults to the explicit configuration.
///
/// Explicit values always win. A missing value with no default is an error.
pub fn resolve_endpoint(
    config: &EthereumConfig,
    defaults: &dyn NetworkDefaults,
) -> BlockchainResult<ResolvedEndpoint> {
    let network = config.network_name.clone();

    let uri = match config.rpc_uri() {
        Some(uri) => uri.to_string(),
        None => match defaults.rpc_uri(&network) {
            Resolution::Resolved(uri) => uri,
            Resolution::Unsupported => return Err(BlockchainError::UnsupportedNetwork(network)),
        },
    };

    let registry = match config.registry_address {
        Some(address) => address,
        None => match defaults.registry_address(&network) {
            Resolution::Resolved(address) => address,
            Resolution::Unsupported => return Err(BlockchainError::NoDefaultAddress(network)),
        },
    };

    let uri = Url::parse(&uri)
        .map_err(|e| BlockchainError::Connection(format!("invalid RPC URI '{}': {}", uri, e)))?;

    Ok(ResolvedEndpoint {
        network,
        uri,
        registry,
    })
}
