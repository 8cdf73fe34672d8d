//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{address, Address, Bytes, TxHash, B256};
use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;

use ingress_node::blockchain::{
    BlockchainError, BlockchainResult, ContractBinder, ContractHandles, KeyMaterial, Ledger, Registry, TransactAuth,
};
use ingress_node::config::{EthereumConfig, NodeEnv};
use ingress_node::identity::{IdentityError, IpLookup, MultiAddress};
use ingress_node::ingress::{FragmentRoute, OpenOrderRequest, OrderFragment, OrderbookClient};
use ingress_node::lifecycle::{Dependencies, Shutdown};
use ingress_node::swarm::{ConnPool, PeerTransport, SwarmClient, SwarmError};

/// Well-known development key (first Anvil/Hardhat account).
pub const NODE_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const NODE_ADDRESS: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");

pub const REGISTRY_ADDRESS: Address = address!("00000000000000000000000000000000000000ab");
pub const LEDGER_ADDRESS: Address = address!("00000000000000000000000000000000000000de");

/// Config file, keystore and environment for one node.
pub struct NodeFixture {
    pub dir: TempDir,
    pub env: NodeEnv,
}

impl NodeFixture {
    /// Fixture on the `local` network with explicit contract addresses.
    pub fn new(port: u16) -> Self {
        Self::with_config(port, base_config())
    }

    pub fn with_config(port: u16, config: Value) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_json(dir.path(), "config.json", &config);
        let keystore_path = write_json(
            dir.path(),
            "keystore.json",
            &json!({ "address": NODE_ADDRESS.to_string(), "privateKey": NODE_PRIVATE_KEY }),
        );
        let env = NodeEnv {
            config_path,
            keystore_path,
            keystore_passphrase: String::new(),
            port: port.to_string(),
        };
        Self { dir, env }
    }
}

pub fn base_config() -> Value {
    json!({
        "ethereum": {
            "networkName": "local",
            "rpcURI": "http://localhost:8545",
            "registryAddress": REGISTRY_ADDRESS.to_string(),
            "ledgerAddress": LEDGER_ADDRESS.to_string()
        },
        "bootstrapMultiAddresses": [],
        "overlay": { "bootstrapTimeoutSecs": 1, "requestTimeoutSecs": 1 }
    })
}

pub fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
    path
}

/// IP lookup returning a fixed body.
pub struct FixedLookup(pub &'static str);

#[async_trait]
impl IpLookup for FixedLookup {
    async fn public_ip(&self) -> Result<String, IdentityError> {
        Ok(self.0.to_string())
    }
}

#[derive(Default)]
pub struct MemoryRegistry {
    pub darknodes: Mutex<HashSet<Address>>,
}

#[async_trait]
impl Registry for MemoryRegistry {
    fn address(&self) -> Address {
        REGISTRY_ADDRESS
    }

    async fn darknodes(&self) -> BlockchainResult<Vec<Address>> {
        Ok(self.darknodes.lock().unwrap().iter().copied().collect())
    }

    async fn is_registered(&self, darknode: Address) -> BlockchainResult<bool> {
        Ok(self.darknodes.lock().unwrap().contains(&darknode))
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    pub fail: bool,
    pub hang: bool,
    pub calls: AtomicUsize,
}

impl MemoryLedger {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    fn address(&self) -> Address {
        LEDGER_ADDRESS
    }

    async fn open_order(&self, _order_id: B256, _signature: Bytes) -> BlockchainResult<TxHash> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(BlockchainError::Rpc("execution reverted".into()));
        }
        Ok(TxHash::repeat_byte(0x11))
    }
}

/// Binder handing out in-memory contracts, or failing with a fixed error.
pub struct MemoryBinder {
    pub registry: Arc<MemoryRegistry>,
    pub ledger: Arc<MemoryLedger>,
    pub failure: Option<fn() -> BlockchainError>,
}

impl MemoryBinder {
    pub fn new(ledger: MemoryLedger) -> Self {
        Self {
            registry: Arc::new(MemoryRegistry::default()),
            ledger: Arc::new(ledger),
            failure: None,
        }
    }

    pub fn failing(failure: fn() -> BlockchainError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(MemoryLedger::default())
        }
    }
}

#[async_trait]
impl ContractBinder for MemoryBinder {
    async fn bind(&self, config: &EthereumConfig, key: &KeyMaterial) -> BlockchainResult<ContractHandles> {
        if let Some(failure) = self.failure {
            return Err(failure());
        }
        Ok(ContractHandles {
            auth: TransactAuth::new(key, config.gas_price_wei),
            registry: self.registry.clone(),
            ledger: self.ledger.clone(),
        })
    }
}

/// Swarm client whose peers live in memory.
pub struct ScriptedSwarm {
    local: MultiAddress,
    reachable: Vec<MultiAddress>,
    hang: bool,
}

#[async_trait]
impl SwarmClient for ScriptedSwarm {
    fn multi_address(&self) -> MultiAddress {
        self.local
    }

    async fn ping(&self, to: &MultiAddress) -> Result<MultiAddress, SwarmError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.reachable.contains(to) {
            Ok(*to)
        } else {
            Err(SwarmError::Transport {
                peer: to.to_string(),
                reason: "connection refused".into(),
            })
        }
    }

    async fn query(&self, _to: &MultiAddress, _target: Address) -> Result<Vec<MultiAddress>, SwarmError> {
        Ok(self.reachable.clone())
    }
}

#[derive(Default)]
pub struct RecordingOrderbook {
    pub delivered: Mutex<Vec<(MultiAddress, OrderFragment)>>,
}

#[async_trait]
impl OrderbookClient for RecordingOrderbook {
    async fn open_order_fragment(&self, to: &MultiAddress, fragment: &OrderFragment) -> Result<(), SwarmError> {
        self.delivered.lock().unwrap().push((*to, fragment.clone()));
        Ok(())
    }
}

/// Transport over [`ScriptedSwarm`] and [`RecordingOrderbook`].
#[derive(Default)]
pub struct ScriptedTransport {
    pub reachable: Vec<MultiAddress>,
    pub hang: bool,
    pub orderbook: Arc<RecordingOrderbook>,
}

impl PeerTransport for ScriptedTransport {
    fn swarm_client(&self, local: MultiAddress, _pool: Arc<ConnPool>) -> Arc<dyn SwarmClient> {
        Arc::new(ScriptedSwarm {
            local,
            reachable: self.reachable.clone(),
            hang: self.hang,
        })
    }

    fn orderbook_client(&self, _pool: Arc<ConnPool>) -> Arc<dyn OrderbookClient> {
        self.orderbook.clone()
    }
}

/// Dependencies wired to in-memory collaborators.
pub fn memory_deps(lookup: &'static str, binder: MemoryBinder, transport: ScriptedTransport) -> Dependencies {
    Dependencies::default()
        .with_ip_lookup(Arc::new(FixedLookup(lookup)))
        .with_binder(Arc::new(binder))
        .with_transport(Arc::new(transport))
        .with_shutdown(Shutdown::new())
}

pub fn peer(n: u8) -> MultiAddress {
    format!("/ip4/10.0.0.{n}/tcp/18514/republic/{}", Address::repeat_byte(n))
        .parse()
        .unwrap()
}

/// A well-formed order routed to the given darknodes.
pub fn order(seed: u8, darknodes: &[u8]) -> OpenOrderRequest {
    let order_id = B256::repeat_byte(seed);
    OpenOrderRequest {
        signature: Bytes::from(vec![seed; 65]),
        order_id,
        order_fragment_mappings: darknodes
            .iter()
            .map(|n| {
                let mut id = [seed; 32];
                id[31] = *n;
                (n, B256::from(id))
            })
            .map(|(n, id)| FragmentRoute {
                darknode: Address::repeat_byte(*n),
                fragment: OrderFragment {
                    id,
                    order_id,
                    data: Bytes::from_static(b"encrypted-share"),
                },
            })
            .collect(),
    }
}

/// Poll `condition` until it holds or `limit` passes.
pub async fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
