//! Darknode orderbook delivery.

use std::sync::Arc;

use async_trait::async_trait;

use crate::identity::MultiAddress;
use crate::ingress::OrderFragment;
use crate::swarm::{ConnPool, SwarmError};

pub const OPEN_ORDER_FRAGMENT_PATH: &str = "/orderbook/fragments";

/// Delivers fragments to darknodes.
#[async_trait]
pub trait OrderbookClient: Send + Sync {
    async fn open_order_fragment(&self, to: &MultiAddress, fragment: &OrderFragment) -> Result<(), SwarmError>;
}

/// [`OrderbookClient`] over HTTP/JSON, sharing the overlay's pool.
pub struct HttpOrderbookClient {
    pool: Arc<ConnPool>,
}

impl HttpOrderbookClient {
    pub fn new(pool: Arc<ConnPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderbookClient for HttpOrderbookClient {
    async fn open_order_fragment(&self, to: &MultiAddress, fragment: &OrderFragment) -> Result<(), SwarmError> {
        let conn = self.pool.acquire().await?;
        conn.post(to, OPEN_ORDER_FRAGMENT_PATH, fragment).await
    }
}
