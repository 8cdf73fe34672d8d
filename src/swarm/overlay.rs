//! Peer overlay handle.

use std::sync::Arc;
use std::time::Duration;

use crate::config::OverlayConfig;
use crate::identity::MultiAddress;
use crate::ingress::OrderbookClient;
use crate::swarm::{ConnPool, DiscoveryTable, PeerTransport, SwarmError, Swarmer};

/// Everything built for one node's overlay participation.
#[derive(Clone)]
pub struct Overlay {
    pool: Arc<ConnPool>,
    swarmer: Arc<Swarmer>,
    orderbook: Arc<dyn OrderbookClient>,
    bootstrap_timeout: Duration,
}

impl Overlay {
    /// Build the table, pool and clients for `local`.
    pub fn construct(
        local: MultiAddress,
        config: &OverlayConfig,
        transport: &dyn PeerTransport,
    ) -> Result<Self, SwarmError> {
        let table = Arc::new(DiscoveryTable::new(local.address(), config.max_peers)?);
        let pool = Arc::new(ConnPool::new(
            config.pool_size,
            Duration::from_secs(config.request_timeout_secs),
        )?);

        let client = transport.swarm_client(local, pool.clone());
        let orderbook = transport.orderbook_client(pool.clone());

        tracing::debug!(
            address = %local,
            max_peers = config.max_peers,
            pool_size = config.pool_size,
            "Overlay constructed"
        );

        Ok(Self {
            pool,
            swarmer: Arc::new(Swarmer::new(client, table)),
            orderbook,
            bootstrap_timeout: Duration::from_secs(config.bootstrap_timeout_secs),
        })
    }

    pub fn swarmer(&self) -> &Arc<Swarmer> {
        &self.swarmer
    }

    pub fn orderbook(&self) -> &Arc<dyn OrderbookClient> {
        &self.orderbook
    }

    pub fn pool(&self) -> &Arc<ConnPool> {
        &self.pool
    }

    pub fn bootstrap_timeout(&self) -> Duration {
        self.bootstrap_timeout
    }

    /// Bootstrap through `seeds`, bounded by the configured timeout.
    pub async fn bootstrap(&self, seeds: &[MultiAddress]) -> Result<usize, SwarmError> {
        self.swarmer.bootstrap_within(seeds, self.bootstrap_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swarm::HttpTransport;

    fn local() -> MultiAddress {
        "/ip4/127.0.0.1/tcp/18514/republic/0x0000000000000000000000000000000000000001"
            .parse()
            .unwrap()
    }

    #[test]
    fn test_construct_from_config() {
        let config = OverlayConfig::default();
        let overlay = Overlay::construct(local(), &config, &HttpTransport).unwrap();
        assert_eq!(overlay.pool().size(), config.pool_size);
        assert_eq!(overlay.swarmer().table().capacity(), config.max_peers);
        assert_eq!(overlay.swarmer().multi_address(), local());
    }

    #[test]
    fn test_invalid_capacity() {
        let config = OverlayConfig {
            max_peers: 0,
            ..OverlayConfig::default()
        };
        assert!(matches!(
            Overlay::construct(local(), &config, &HttpTransport),
            Err(SwarmError::InvalidCapacity(_))
        ));
    }
}
