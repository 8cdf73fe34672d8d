//! Contract binding.
//!
//! # Responsibilities
//! - Build the transaction-signing authorization from the key material
//! - Dial the chain and bind the registry and ledger contracts
//!
//! # Design Decisions
//! - Gas price is a fixed configured value, not a market estimate
//! - A ledger failure after the registry bound is logged with the partial
//!   binding and then discarded; nothing partial is returned

use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::DynProvider;
use async_trait::async_trait;

use crate::blockchain::client::RpcConnection;
use crate::blockchain::contracts::{ChainLedger, ChainRegistry, Ledger, Registry};
use crate::blockchain::network::{NetworkDefaults, StaticNetworkDefaults};
use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::blockchain::wallet::KeyMaterial;
use crate::config::EthereumConfig;

/// Authorization to sign transactions as the node.
#[derive(Clone)]
pub struct TransactAuth {
    from: Address,
    gas_price: u128,
    wallet: EthereumWallet,
}

impl TransactAuth {
    pub fn new(key: &KeyMaterial, gas_price_wei: u64) -> Self {
        Self {
            from: key.address(),
            gas_price: u128::from(gas_price_wei),
            wallet: key.wallet(),
        }
    }

    /// Sender address of every transaction.
    pub fn from(&self) -> Address {
        self.from
    }

    /// Gas price in wei.
    pub fn gas_price(&self) -> u128 {
        self.gas_price
    }

    pub fn wallet(&self) -> &EthereumWallet {
        &self.wallet
    }
}

impl std::fmt::Debug for TransactAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactAuth")
            .field("from", &self.from)
            .field("gas_price", &self.gas_price)
            .finish_non_exhaustive()
    }
}

/// Everything the node needs from the chain, created once at startup.
#[derive(Clone)]
pub struct ContractHandles {
    pub auth: TransactAuth,
    pub registry: Arc<dyn Registry>,
    pub ledger: Arc<dyn Ledger>,
}

impl std::fmt::Debug for ContractHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractHandles")
            .field("from", &self.auth.from())
            .field("registry", &self.registry.address())
            .field("ledger", &self.ledger.address())
            .finish()
    }
}

/// Produces [`ContractHandles`] for a configuration and key.
#[async_trait]
pub trait ContractBinder: Send + Sync {
    async fn bind(&self, config: &EthereumConfig, key: &KeyMaterial) -> BlockchainResult<ContractHandles>;
}

/// Binds the deployed contracts over JSON-RPC.
pub struct EthereumBinder {
    defaults: Arc<dyn NetworkDefaults>,
}

impl EthereumBinder {
    pub fn new(defaults: Arc<dyn NetworkDefaults>) -> Self {
        Self { defaults }
    }
}

impl Default for EthereumBinder {
    fn default() -> Self {
        Self::new(Arc::new(StaticNetworkDefaults))
    }
}

#[async_trait]
impl ContractBinder for EthereumBinder {
    async fn bind(&self, config: &EthereumConfig, key: &KeyMaterial) -> BlockchainResult<ContractHandles> {
        let conn = RpcConnection::connect(config, self.defaults.as_ref()).await?;
        let auth = TransactAuth::new(key, config.gas_price_wei);
        let signing = conn.signing_provider(&auth);

        // 1. Registry
        let registry_address = conn.endpoint().registry;
        conn.ensure_deployed("registry", registry_address).await?;
        let registry = ChainRegistry::new(registry_address, signing.clone(), conn.timeout());

        // 2. Ledger, configured or published by the registry
        let ledger = bind_ledger(config, &conn, &registry, signing, auth.gas_price()).await;

        let ledger = match ledger {
            Ok(ledger) => ledger,
            Err(e) => {
                tracing::error!(
                    from = %auth.from(),
                    registry = %registry_address,
                    error = %e,
                    "Registry bound but ledger binding failed; discarding partial binding"
                );
                return Err(e);
            }
        };

        tracing::info!(
            from = %auth.from(),
            registry = %registry_address,
            ledger = %Ledger::address(&ledger),
            gas_price_wei = auth.gas_price(),
            "Contracts bound"
        );

        Ok(ContractHandles {
            auth,
            registry: Arc::new(registry),
            ledger: Arc::new(ledger),
        })
    }
}

async fn bind_ledger(
    config: &EthereumConfig,
    conn: &RpcConnection,
    registry: &ChainRegistry,
    signing: DynProvider,
    gas_price: u128,
) -> BlockchainResult<ChainLedger> {
    let ledger_address = match config.ledger_address {
        Some(address) => address,
        None => registry
            .ledger_address()
            .await
            .map_err(|e| BlockchainError::ContractBind {
                contract: "ledger",
                reason: format!("cannot read ledger address from registry: {}", e),
            })?,
    };
    conn.ensure_deployed("ledger", ledger_address).await?;
    Ok(ChainLedger::new(ledger_address, signing, gas_price, conn.timeout()))
}
