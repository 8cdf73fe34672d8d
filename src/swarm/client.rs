//! Overlay wire protocol.
//!
//! Two JSON endpoints are spoken between peers:
//! - `POST /swarm/ping`: announce ourselves, learn the responder's address
//! - `POST /swarm/query`: ask a peer for addresses near a target node

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::identity::MultiAddress;
use crate::swarm::{ConnPool, SwarmError};

pub const PING_PATH: &str = "/swarm/ping";
pub const QUERY_PATH: &str = "/swarm/query";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingRequest {
    pub multi_address: MultiAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub multi_address: MultiAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub target: Address,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub multi_addresses: Vec<MultiAddress>,
}

/// Outbound overlay operations.
#[async_trait]
pub trait SwarmClient: Send + Sync {
    /// Address this client announces.
    fn multi_address(&self) -> MultiAddress;

    /// Ping `to` and return the address it answers with.
    async fn ping(&self, to: &MultiAddress) -> Result<MultiAddress, SwarmError>;

    /// Ask `to` for peers it knows near `target`.
    async fn query(&self, to: &MultiAddress, target: Address) -> Result<Vec<MultiAddress>, SwarmError>;
}

/// [`SwarmClient`] over HTTP/JSON.
pub struct HttpSwarmClient {
    local: MultiAddress,
    pool: Arc<ConnPool>,
}

impl HttpSwarmClient {
    pub fn new(local: MultiAddress, pool: Arc<ConnPool>) -> Self {
        Self { local, pool }
    }
}

#[async_trait]
impl SwarmClient for HttpSwarmClient {
    fn multi_address(&self) -> MultiAddress {
        self.local
    }

    async fn ping(&self, to: &MultiAddress) -> Result<MultiAddress, SwarmError> {
        let conn = self.pool.acquire().await?;
        let request = PingRequest {
            multi_address: self.local,
        };
        let response: PingResponse = conn.post_json(to, PING_PATH, &request).await?;

        if response.multi_address.address() != to.address() {
            return Err(SwarmError::Transport {
                peer: to.to_string(),
                reason: format!("peer answered as {}", response.multi_address),
            });
        }
        Ok(response.multi_address)
    }

    async fn query(&self, to: &MultiAddress, target: Address) -> Result<Vec<MultiAddress>, SwarmError> {
        let conn = self.pool.acquire().await?;
        let response: QueryResponse = conn.post_json(to, QUERY_PATH, &QueryRequest { target }).await?;
        Ok(response.multi_addresses)
    }
}
