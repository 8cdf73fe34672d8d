//! Discovery table.
//!
//! Tracks reachable peers keyed by node address. The owning node is never
//! stored and the table never grows past its capacity.

use std::sync::Mutex;

use alloy::primitives::Address;
use dashmap::DashMap;

use crate::identity::MultiAddress;
use crate::swarm::SwarmError;

/// Known overlay members.
#[derive(Debug)]
pub struct DiscoveryTable {
    owner: Address,
    capacity: usize,
    peers: DashMap<Address, MultiAddress>,
    /// Serializes inserts of new keys so the capacity check holds.
    insert_lock: Mutex<()>,
}

impl DiscoveryTable {
    pub fn new(owner: Address, capacity: usize) -> Result<Self, SwarmError> {
        if capacity == 0 {
            return Err(SwarmError::InvalidCapacity("discovery table capacity"));
        }
        Ok(Self {
            owner,
            capacity,
            peers: DashMap::new(),
            insert_lock: Mutex::new(()),
        })
    }

    /// Insert or refresh a peer. Returns whether the peer is now stored.
    pub fn update(&self, peer: MultiAddress) -> bool {
        let key = peer.address();
        if key == self.owner {
            return false;
        }
        if let Some(mut existing) = self.peers.get_mut(&key) {
            *existing = peer;
            return true;
        }

        let _guard = match self.insert_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.peers.contains_key(&key) {
            self.peers.insert(key, peer);
            return true;
        }
        if self.peers.len() >= self.capacity {
            tracing::debug!(peer = %peer, capacity = self.capacity, "Discovery table full");
            return false;
        }
        self.peers.insert(key, peer);
        tracing::debug!(peer = %peer, size = self.peers.len(), "Peer added");
        true
    }

    pub fn remove(&self, address: &Address) -> Option<MultiAddress> {
        self.peers.remove(address).map(|(_, peer)| peer)
    }

    pub fn get(&self, address: &Address) -> Option<MultiAddress> {
        self.peers.get(address).map(|r| *r.value())
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.peers.contains_key(address)
    }

    /// Snapshot of all peers, ordered by node address.
    pub fn multi_addresses(&self) -> Vec<MultiAddress> {
        let mut peers: Vec<MultiAddress> = self.peers.iter().map(|r| *r.value()).collect();
        peers.sort_by_key(|peer| peer.address());
        peers
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.peers.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn owner(&self) -> Address {
        self.owner
    }
}
