//! Ingestion process supervision and error streams.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::ingress::{Ingress, IngressError, Pipeline};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Producing half of an [`ErrorStream`], owned by the running process.
#[derive(Debug)]
pub struct ErrorSender {
    pipeline: Pipeline,
    tx: mpsc::UnboundedSender<IngressError>,
}

impl ErrorSender {
    pub fn pipeline(&self) -> Pipeline {
        self.pipeline
    }

    pub fn send(&self, error: IngressError) {
        // The consumer may already be gone during shutdown.
        let _ = self.tx.send(error);
    }
}

/// Errors reported by one ingestion process.
///
/// Unbounded; ends with `None` once, after the process has stopped.
#[derive(Debug)]
pub struct ErrorStream {
    pipeline: Pipeline,
    rx: mpsc::UnboundedReceiver<IngressError>,
}

impl ErrorStream {
    pub fn channel(pipeline: Pipeline) -> (ErrorSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ErrorSender { pipeline, tx }, Self { pipeline, rx })
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline
    }

    pub async fn next(&mut self) -> Option<IngressError> {
        self.rx.recv().await
    }
}

/// Error streams of both ingestion processes.
#[derive(Debug)]
pub struct IngestionStreams {
    pub orders: ErrorStream,
    pub fragments: ErrorStream,
}

/// Starts the ingestion processes.
pub struct IngestionSupervisor;

impl IngestionSupervisor {
    pub fn start(ingress: &Arc<Ingress>, shutdown: &Shutdown) -> IngestionStreams {
        let orders = ingress.open_order_process(shutdown.clone());
        let fragments = ingress.open_order_fragments_process(shutdown.clone());
        debug!("Ingestion processes started");
        IngestionStreams { orders, fragments }
    }
}

/// Log every error on `stream` until it closes.
///
/// The handle resolves to the number of errors seen.
pub fn drain_errors(mut stream: ErrorStream) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let pipeline = stream.pipeline();
        let mut count = 0usize;
        while let Some(error) = stream.next().await {
            count += 1;
            metrics::record_ingestion_error(pipeline);
            warn!(pipeline = %pipeline, error = %error, "Error processing {}", pipeline);
        }
        debug!(pipeline = %pipeline, errors = count, "Error stream closed");
        count
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;

    #[tokio::test]
    async fn test_drain_counts_until_closed() {
        let (tx, stream) = ErrorStream::channel(Pipeline::Orders);
        let drained = drain_errors(stream);

        tx.send(IngressError::Busy);
        tx.send(IngressError::Stopped);
        tx.send(IngressError::UnknownDarknode(Address::ZERO));
        drop(tx);

        assert_eq!(drained.await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_send_after_consumer_dropped() {
        let (tx, stream) = ErrorStream::channel(Pipeline::OrderFragments);
        drop(stream);
        tx.send(IngressError::Busy);
        assert_eq!(tx.pipeline(), Pipeline::OrderFragments);
    }
}
