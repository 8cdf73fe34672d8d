//! Construction seam for peer-facing clients.

use std::sync::Arc;

use crate::identity::MultiAddress;
use crate::ingress::{HttpOrderbookClient, OrderbookClient};
use crate::swarm::{ConnPool, HttpSwarmClient, SwarmClient};

/// Builds the clients the overlay and ingress pipelines talk through.
pub trait PeerTransport: Send + Sync {
    fn swarm_client(&self, local: MultiAddress, pool: Arc<ConnPool>) -> Arc<dyn SwarmClient>;

    fn orderbook_client(&self, pool: Arc<ConnPool>) -> Arc<dyn OrderbookClient>;
}

/// HTTP/JSON transport over a shared [`ConnPool`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl PeerTransport for HttpTransport {
    fn swarm_client(&self, local: MultiAddress, pool: Arc<ConnPool>) -> Arc<dyn SwarmClient> {
        Arc::new(HttpSwarmClient::new(local, pool))
    }

    fn orderbook_client(&self, pool: Arc<ConnPool>) -> Arc<dyn OrderbookClient> {
        Arc::new(HttpOrderbookClient::new(pool))
    }
}
