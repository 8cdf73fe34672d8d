//! Blockchain RPC connection with timeout and error handling.
//!
//! # Responsibilities
//! - Resolve the endpoint from configuration and network defaults
//! - Dial the JSON-RPC endpoint and confirm it answers
//! - Check that contracts are deployed before binding to them
//! - Hand out signing providers for transaction submission

use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use tokio::time::timeout;

use crate::blockchain::binder::TransactAuth;
use crate::blockchain::network::{resolve_endpoint, NetworkDefaults, ResolvedEndpoint};
use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId};
use crate::config::EthereumConfig;

/// A dialed JSON-RPC endpoint.
#[derive(Clone)]
pub struct RpcConnection {
    provider: DynProvider,
    endpoint: ResolvedEndpoint,
    chain_id: ChainId,
    timeout_duration: Duration,
}

impl RpcConnection {
    /// Resolve the endpoint for `config` and dial it.
    pub async fn connect(
        config: &EthereumConfig,
        defaults: &dyn NetworkDefaults,
    ) -> BlockchainResult<Self> {
        let endpoint = resolve_endpoint(config, defaults)?;
        Self::dial(endpoint, Duration::from_secs(config.rpc_timeout_secs)).await
    }

    /// Dial an already resolved endpoint.
    ///
    /// HTTP transports are connectionless, so the dial is confirmed with an
    /// `eth_chainId` round trip.
    pub async fn dial(endpoint: ResolvedEndpoint, timeout_duration: Duration) -> BlockchainResult<Self> {
        let provider = ProviderBuilder::new()
            .connect_http(endpoint.uri.clone())
            .erased();

        let chain_id = match timeout(timeout_duration, provider.get_chain_id()).await {
            Ok(Ok(id)) => ChainId(id),
            Ok(Err(e)) => {
                return Err(BlockchainError::Connection(format!("{}: {}", endpoint.uri, e)));
            }
            Err(_) => {
                return Err(BlockchainError::Connection(format!(
                    "{}: no response within {}s",
                    endpoint.uri,
                    timeout_duration.as_secs()
                )));
            }
        };

        tracing::info!(
            network = %endpoint.network,
            rpc_uri = %endpoint.uri,
            chain_id = chain_id.0,
            "Connected to ethereum"
        );

        Ok(Self {
            provider,
            endpoint,
            chain_id,
            timeout_duration,
        })
    }

    /// Provider that signs and submits transactions as `auth`.
    pub fn signing_provider(&self, auth: &TransactAuth) -> DynProvider {
        ProviderBuilder::new()
            .wallet(auth.wallet().clone())
            .connect_http(self.endpoint.uri.clone())
            .erased()
    }

    /// Fail unless contract bytecode is deployed at `address`.
    pub async fn ensure_deployed(&self, contract: &'static str, address: Address) -> BlockchainResult<()> {
        let code = match timeout(self.timeout_duration, self.provider.get_code_at(address)).await {
            Ok(Ok(code)) => code,
            Ok(Err(e)) => {
                return Err(BlockchainError::ContractBind {
                    contract,
                    reason: format!("cannot read code at {}: {}", address, e),
                });
            }
            Err(_) => {
                return Err(BlockchainError::ContractBind {
                    contract,
                    reason: format!("timed out reading code at {}", address),
                });
            }
        };

        if code.is_empty() {
            return Err(BlockchainError::ContractBind {
                contract,
                reason: format!("no contract deployed at {}", address),
            });
        }
        Ok(())
    }

    /// Get the underlying read-only provider.
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub fn endpoint(&self) -> &ResolvedEndpoint {
        &self.endpoint
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_duration
    }
}

impl std::fmt::Debug for RpcConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcConnection")
            .field("network", &self.endpoint.network)
            .field("rpc_uri", &self.endpoint.uri.as_str())
            .field("chain_id", &self.chain_id.0)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::network::StaticNetworkDefaults;

    fn test_config(network: &str, rpc_uri: Option<&str>) -> EthereumConfig {
        serde_json::from_value(serde_json::json!({
            "networkName": network,
            "rpcURI": rpc_uri,
            "registryAddress": "0x5bf19a6ea8631bb722ade58e0d2c5813740c88fd",
            "rpcTimeoutSecs": 2,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_error() {
        // Nothing listens on port 1.
        let config = test_config("local", Some("http://127.0.0.1:1"));
        let err = RpcConnection::connect(&config, &StaticNetworkDefaults)
            .await
            .unwrap_err();
        assert!(matches!(err, BlockchainError::Connection(_)), "{}", err);
    }

    #[tokio::test]
    async fn test_unsupported_network_fails_before_dialing() {
        let config = test_config("mainnet", None);
        let err = RpcConnection::connect(&config, &StaticNetworkDefaults)
            .await
            .unwrap_err();
        assert!(matches!(err, BlockchainError::UnsupportedNetwork(_)));
    }
}
