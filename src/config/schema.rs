//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the JSON config
//! file. Keys are camelCase to match the files operators already deploy.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::identity::MultiAddress;

/// Root configuration for an ingress node.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    /// Blockchain connection parameters.
    pub ethereum: EthereumConfig,

    /// Seed peers contacted when joining the overlay, in order.
    #[serde(default)]
    pub bootstrap_multi_addresses: Vec<MultiAddress>,

    /// Public address discovery.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Discovery table and connection pool sizing.
    #[serde(default)]
    pub overlay: OverlayConfig,

    /// Ingestion pipeline settings.
    #[serde(default)]
    pub ingress: IngressConfig,

    /// Public API server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Blockchain connection parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EthereumConfig {
    /// Named network environment (testnet, staging, nightly, local).
    pub network_name: String,

    /// JSON-RPC endpoint. Falls back to the network default when unset.
    #[serde(rename = "rpcURI", default, skip_serializing_if = "Option::is_none")]
    pub rpc_uri: Option<String>,

    /// Registry contract address. Falls back to the network default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_address: Option<Address>,

    /// Ledger contract address. Read from the registry when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_address: Option<Address>,

    /// Fixed gas price attached to every transaction, in wei.
    #[serde(default = "default_gas_price_wei")]
    pub gas_price_wei: u64,

    /// Timeout applied to every RPC call, in seconds.
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
}

impl EthereumConfig {
    /// Configured RPC endpoint, treating an empty string as unset.
    pub fn rpc_uri(&self) -> Option<&str> {
        self.rpc_uri.as_deref().filter(|uri| !uri.trim().is_empty())
    }
}

fn default_gas_price_wei() -> u64 {
    1_000_000_000
}

fn default_rpc_timeout_secs() -> u64 {
    10
}

/// Public address discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdentityConfig {
    /// IP-echo service returning the caller's public IPv4 address as text.
    pub ip_lookup_url: String,

    /// Timeout for the IP lookup, in seconds.
    pub lookup_timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            ip_lookup_url: "https://ipinfo.io/ip".to_string(),
            lookup_timeout_secs: 10,
        }
    }
}

/// Overlay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayConfig {
    /// Maximum number of peers held in the discovery table.
    pub max_peers: usize,

    /// Maximum concurrent outbound connections shared by all peer clients.
    pub pool_size: usize,

    /// Upper bound on the overlay bootstrap, in seconds.
    pub bootstrap_timeout_secs: u64,

    /// Timeout for a single peer request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            max_peers: 100,
            pool_size: 100,
            bootstrap_timeout_secs: 60,
            request_timeout_secs: 5,
        }
    }
}

/// Ingestion pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IngressConfig {
    /// Pending submissions buffered per pipeline before callers see `Busy`.
    pub queue_capacity: usize,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
        }
    }
}

/// Public API server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for development.
    #[default]
    Pretty,
    /// One JSON object per line, for log aggregation.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: NodeConfig =
            serde_json::from_str(r#"{ "ethereum": { "networkName": "nightly" } }"#).unwrap();

        assert_eq!(config.ethereum.network_name, "nightly");
        assert!(config.ethereum.rpc_uri().is_none());
        assert_eq!(config.ethereum.gas_price_wei, 1_000_000_000);
        assert!(config.bootstrap_multi_addresses.is_empty());
        assert_eq!(config.overlay.max_peers, 100);
        assert_eq!(config.overlay.bootstrap_timeout_secs, 60);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_full_ethereum_section() {
        let config: NodeConfig = serde_json::from_str(
            r#"{
                "ethereum": {
                    "networkName": "local",
                    "rpcURI": "http://localhost:8545",
                    "registryAddress": "0x5bf19a6ea8631bb722ade58e0d2c5813740c88fd",
                    "ledgerAddress": "0xcf2f6b4b698cd6a6b3eb1d874a939742d15f8e7e"
                },
                "bootstrapMultiAddresses": [
                    "/ip4/10.0.0.1/tcp/18514/republic/0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.ethereum.rpc_uri(), Some("http://localhost:8545"));
        assert!(config.ethereum.registry_address.is_some());
        assert!(config.ethereum.ledger_address.is_some());
        assert_eq!(config.bootstrap_multi_addresses.len(), 1);
        assert_eq!(config.bootstrap_multi_addresses[0].port(), 18514);
    }

    #[test]
    fn test_empty_rpc_uri_is_unset() {
        let config: NodeConfig = serde_json::from_str(
            r#"{ "ethereum": { "networkName": "testnet", "rpcURI": "" } }"#,
        )
        .unwrap();
        assert!(config.ethereum.rpc_uri().is_none());
    }

    #[test]
    fn test_malformed_bootstrap_address_rejected() {
        let result: Result<NodeConfig, _> = serde_json::from_str(
            r#"{ "ethereum": { "networkName": "testnet" }, "bootstrapMultiAddresses": ["nope"] }"#,
        );
        assert!(result.is_err());
    }
}
