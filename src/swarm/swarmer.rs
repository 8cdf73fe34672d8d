//! Overlay membership: bootstrap, lookup and inbound handling.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::identity::MultiAddress;
use crate::observability::metrics;
use crate::swarm::{DiscoveryTable, SwarmClient, SwarmError};

/// Upper bound on addresses returned for a single query.
const MAX_QUERY_RESULTS: usize = 32;

pub struct Swarmer {
    client: Arc<dyn SwarmClient>,
    table: Arc<DiscoveryTable>,
}

impl Swarmer {
    pub fn new(client: Arc<dyn SwarmClient>, table: Arc<DiscoveryTable>) -> Self {
        Self { client, table }
    }

    pub fn multi_address(&self) -> MultiAddress {
        self.client.multi_address()
    }

    pub fn table(&self) -> &Arc<DiscoveryTable> {
        &self.table
    }

    /// Join the overlay through `seeds`.
    ///
    /// Seeds are pinged concurrently and every responder is stored. Each
    /// responder is then asked for peers near our own address, which are
    /// pinged and stored until the table is full. Any unreachable seed makes
    /// the result an error, but peers learned so far stay in the table.
    ///
    /// Returns the number of known peers.
    pub async fn bootstrap(&self, seeds: &[MultiAddress]) -> Result<usize, SwarmError> {
        let own = self.multi_address().address();
        let seeds: Vec<MultiAddress> = seeds.iter().copied().filter(|seed| seed.address() != own).collect();
        if seeds.is_empty() {
            warn!("No bootstrap peers configured");
            return Ok(self.table.len());
        }

        let pings = seeds.iter().map(|seed| async move { (*seed, self.client.ping(seed).await) });
        let mut responders = Vec::with_capacity(seeds.len());
        let mut failures = Vec::new();
        for (seed, result) in join_all(pings).await {
            match result {
                Ok(peer) => {
                    self.table.update(peer);
                    responders.push(peer);
                }
                Err(e) => {
                    warn!(peer = %seed, error = %e, "Bootstrap peer unreachable");
                    failures.push(format!("{seed}: {e}"));
                }
            }
        }

        for responder in responders {
            if self.table.is_full() {
                break;
            }
            self.discover_through(&responder, own).await;
        }

        let known = self.table.len();
        metrics::record_peer_count(known);

        if failures.is_empty() {
            info!(peers = known, "Bootstrap complete");
            Ok(known)
        } else {
            Err(SwarmError::Bootstrap {
                failed: failures.len(),
                total: seeds.len(),
                reasons: failures.join("; "),
            })
        }
    }

    /// [`bootstrap`](Self::bootstrap) cancelled after `limit`.
    pub async fn bootstrap_within(&self, seeds: &[MultiAddress], limit: Duration) -> Result<usize, SwarmError> {
        match tokio::time::timeout(limit, self.bootstrap(seeds)).await {
            Ok(result) => result,
            Err(_) => {
                metrics::record_peer_count(self.table.len());
                Err(SwarmError::Timeout(limit))
            }
        }
    }

    async fn discover_through(&self, responder: &MultiAddress, target: Address) {
        let found = match self.client.query(responder, target).await {
            Ok(found) => found,
            Err(e) => {
                warn!(peer = %responder, error = %e, "Peer query failed");
                return;
            }
        };

        for candidate in found {
            if self.table.is_full() {
                return;
            }
            if candidate.address() == target || self.table.contains(&candidate.address()) {
                continue;
            }
            match self.client.ping(&candidate).await {
                Ok(peer) => {
                    self.table.update(peer);
                }
                Err(e) => debug!(peer = %candidate, error = %e, "Discovered peer unreachable"),
            }
        }
    }

    /// Locate `target`, asking known peers when it is not in the table.
    pub async fn query(&self, target: Address) -> Result<Option<MultiAddress>, SwarmError> {
        if let Some(peer) = self.table.get(&target) {
            return Ok(Some(peer));
        }

        let mut last_error = None;
        for peer in self.table.multi_addresses() {
            match self.client.query(&peer, target).await {
                Ok(found) => {
                    if let Some(hit) = found.into_iter().find(|candidate| candidate.address() == target) {
                        self.table.update(hit);
                        return Ok(Some(hit));
                    }
                }
                Err(e) => {
                    debug!(peer = %peer, error = %e, "Query failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if self.table.is_empty() => Err(e),
            _ => Ok(None),
        }
    }

    /// Handle an inbound ping: remember the sender and answer with our address.
    pub fn ping_from(&self, remote: MultiAddress) -> MultiAddress {
        if self.table.update(remote) {
            metrics::record_peer_count(self.table.len());
        }
        self.multi_address()
    }

    /// Handle an inbound query.
    pub fn answer_query(&self, target: Address) -> Vec<MultiAddress> {
        if let Some(peer) = self.table.get(&target) {
            return vec![peer];
        }
        let mut peers = self.table.multi_addresses();
        peers.truncate(MAX_QUERY_RESULTS);
        peers
    }

    pub fn peers(&self) -> Vec<MultiAddress> {
        self.table.multi_addresses()
    }
}
