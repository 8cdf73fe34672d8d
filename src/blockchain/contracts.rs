//! Registry and ledger contract bindings.
//!
//! The ingress pipelines talk to [`Registry`] and [`Ledger`] trait objects;
//! [`ChainRegistry`] and [`ChainLedger`] are the on-chain implementations.

use std::time::Duration;

use alloy::primitives::{Address, Bytes, TxHash, B256};
use alloy::providers::DynProvider;
use alloy::sol;
use async_trait::async_trait;
use tokio::time::timeout;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

sol! {
    /// Tracks registered darknodes.
    #[sol(rpc)]
    interface DarknodeRegistry {
        function getDarknodes() external view returns (address[] memory);
        function isRegistered(address darknodeID) external view returns (bool);
        function ledger() external view returns (address);
    }

    /// Records order commitments.
    #[sol(rpc)]
    interface OrderbookLedger {
        function openOrder(bytes calldata signature, bytes32 orderId) external;
        function orderState(bytes32 orderId) external view returns (uint8);
    }
}

/// Read access to the darknode registry.
#[async_trait]
pub trait Registry: Send + Sync {
    fn address(&self) -> Address;

    /// All currently registered darknodes.
    async fn darknodes(&self) -> BlockchainResult<Vec<Address>>;

    async fn is_registered(&self, darknode: Address) -> BlockchainResult<bool>;
}

/// Write access to the order ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    fn address(&self) -> Address;

    /// Commit an order on-chain. Returns the submitted transaction hash.
    async fn open_order(&self, order_id: B256, signature: Bytes) -> BlockchainResult<TxHash>;
}

fn rpc_error(call: &str, e: impl std::fmt::Display) -> BlockchainError {
    BlockchainError::Rpc(format!("{} failed: {}", call, e))
}

/// Registry bound to a deployed contract.
pub struct ChainRegistry {
    contract: DarknodeRegistry::DarknodeRegistryInstance<DynProvider>,
    timeout_duration: Duration,
}

impl ChainRegistry {
    pub fn new(address: Address, provider: DynProvider, timeout_duration: Duration) -> Self {
        Self {
            contract: DarknodeRegistry::new(address, provider),
            timeout_duration,
        }
    }

    /// Ledger address published by the registry.
    pub async fn ledger_address(&self) -> BlockchainResult<Address> {
        match timeout(self.timeout_duration, self.contract.ledger().call()).await {
            Ok(Ok(address)) => Ok(address),
            Ok(Err(e)) => Err(rpc_error("ledger()", e)),
            Err(_) => Err(BlockchainError::Timeout(self.timeout_duration.as_secs())),
        }
    }
}

#[async_trait]
impl Registry for ChainRegistry {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn darknodes(&self) -> BlockchainResult<Vec<Address>> {
        match timeout(self.timeout_duration, self.contract.getDarknodes().call()).await {
            Ok(Ok(darknodes)) => Ok(darknodes),
            Ok(Err(e)) => Err(rpc_error("getDarknodes()", e)),
            Err(_) => Err(BlockchainError::Timeout(self.timeout_duration.as_secs())),
        }
    }

    async fn is_registered(&self, darknode: Address) -> BlockchainResult<bool> {
        match timeout(self.timeout_duration, self.contract.isRegistered(darknode).call()).await {
            Ok(Ok(registered)) => Ok(registered),
            Ok(Err(e)) => Err(rpc_error("isRegistered()", e)),
            Err(_) => Err(BlockchainError::Timeout(self.timeout_duration.as_secs())),
        }
    }
}

/// Ledger bound to a deployed contract, signing with a fixed gas price.
pub struct ChainLedger {
    contract: OrderbookLedger::OrderbookLedgerInstance<DynProvider>,
    gas_price: u128,
    timeout_duration: Duration,
}

impl ChainLedger {
    /// `provider` must carry the signing wallet.
    pub fn new(address: Address, provider: DynProvider, gas_price: u128, timeout_duration: Duration) -> Self {
        Self {
            contract: OrderbookLedger::new(address, provider),
            gas_price,
            timeout_duration,
        }
    }
}

#[async_trait]
impl Ledger for ChainLedger {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn open_order(&self, order_id: B256, signature: Bytes) -> BlockchainResult<TxHash> {
        let call = self.contract.openOrder(signature, order_id).gas_price(self.gas_price);
        match timeout(self.timeout_duration, call.send()).await {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => Err(rpc_error("openOrder()", e)),
            Err(_) => Err(BlockchainError::Timeout(self.timeout_duration.as_secs())),
        }
    }
}
