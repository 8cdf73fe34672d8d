//! Shutdown coordination for the node.

use tokio_util::sync::CancellationToken;

/// Coordinator for graceful shutdown.
///
/// Cheap to clone; every clone observes the same signal. Long-running tasks
/// hold a clone and stop once [`cancelled`](Shutdown::cancelled) resolves.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger the shutdown signal. Idempotent.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once shutdown has been triggered.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Underlying token, for APIs that take one directly.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}
