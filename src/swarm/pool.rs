//! Bounded connection pool shared by overlay and orderbook traffic.
//!
//! A single keep-alive HTTP client is reused for every peer. Concurrency is
//! capped by a semaphore: a request holds a slot for its whole lifetime and
//! the slot is released when the [`PooledConn`] is dropped.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::identity::MultiAddress;
use crate::swarm::SwarmError;

#[derive(Debug)]
pub struct ConnPool {
    client: reqwest::Client,
    slots: Arc<Semaphore>,
    size: usize,
}

impl ConnPool {
    pub fn new(size: usize, request_timeout: Duration) -> Result<Self, SwarmError> {
        if size == 0 {
            return Err(SwarmError::InvalidCapacity("connection pool size"));
        }
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .pool_max_idle_per_host(1)
            .build()
            .map_err(|e| SwarmError::Pool(e.to_string()))?;

        Ok(Self {
            client,
            slots: Arc::new(Semaphore::new(size)),
            size,
        })
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<PooledConn, SwarmError> {
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| SwarmError::Pool("pool closed".to_string()))?;

        Ok(PooledConn {
            client: self.client.clone(),
            _permit: permit,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }
}

/// A checked-out slot. Dropping it returns the slot to the pool.
#[derive(Debug)]
pub struct PooledConn {
    client: reqwest::Client,
    _permit: OwnedSemaphorePermit,
}

impl PooledConn {
    /// POST a JSON body to `path` on `peer` and decode the JSON reply.
    pub async fn post_json<B, R>(&self, peer: &MultiAddress, path: &str, body: &B) -> Result<R, SwarmError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", peer.http_base(), path);
        let transport = |reason: String| SwarmError::Transport {
            peer: peer.to_string(),
            reason,
        };

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(transport(format!("unexpected status {status}")));
        }

        response.json::<R>().await.map_err(|e| transport(e.to_string()))
    }

    /// POST a JSON body and only check the status code.
    pub async fn post(&self, peer: &MultiAddress, path: &str, body: &impl Serialize) -> Result<(), SwarmError> {
        let url = format!("{}{}", peer.http_base(), path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| SwarmError::Transport {
                peer: peer.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SwarmError::Transport {
                peer: peer.to_string(),
                reason: format!("unexpected status {status}"),
            });
        }
        Ok(())
    }
}
