//! Order and fragment processing.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use alloy::primitives::Address;
use arc_swap::ArcSwap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::blockchain::{Ledger, Registry};
use crate::config::IngressConfig;
use crate::ingress::supervisor::ErrorSender;
use crate::ingress::{ErrorStream, FragmentRoute, IngressError, OpenOrderRequest, OrderbookClient, Pipeline};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::swarm::Swarmer;

/// Accepts orders and drives them to the ledger and darknodes.
pub struct Ingress {
    registry: Arc<dyn Registry>,
    ledger: Arc<dyn Ledger>,
    swarmer: Arc<Swarmer>,
    orderbook: Arc<dyn OrderbookClient>,

    orders_tx: mpsc::Sender<OpenOrderRequest>,
    orders_rx: Mutex<Option<mpsc::Receiver<OpenOrderRequest>>>,
    fragments_tx: mpsc::Sender<FragmentRoute>,
    fragments_rx: Mutex<Option<mpsc::Receiver<FragmentRoute>>>,

    /// Registered darknodes as of the last sync.
    darknodes: ArcSwap<HashSet<Address>>,
}

fn enqueue<T>(tx: &mpsc::Sender<T>, item: T) -> Result<(), IngressError> {
    tx.try_send(item).map_err(|e| match e {
        TrySendError::Full(_) => IngressError::Busy,
        TrySendError::Closed(_) => IngressError::Stopped,
    })
}

fn take_receiver<T>(slot: &Mutex<Option<mpsc::Receiver<T>>>) -> Option<mpsc::Receiver<T>> {
    match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    }
}

impl Ingress {
    pub fn new(
        registry: Arc<dyn Registry>,
        ledger: Arc<dyn Ledger>,
        swarmer: Arc<Swarmer>,
        orderbook: Arc<dyn OrderbookClient>,
        config: &IngressConfig,
    ) -> Self {
        let capacity = config.queue_capacity.max(1);
        let (orders_tx, orders_rx) = mpsc::channel(capacity);
        let (fragments_tx, fragments_rx) = mpsc::channel(capacity);

        Self {
            registry,
            ledger,
            swarmer,
            orderbook,
            orders_tx,
            orders_rx: Mutex::new(Some(orders_rx)),
            fragments_tx,
            fragments_rx: Mutex::new(Some(fragments_rx)),
            darknodes: ArcSwap::from_pointee(HashSet::new()),
        }
    }

    /// Validate and queue an order.
    pub fn open_order(&self, request: OpenOrderRequest) -> Result<(), IngressError> {
        request.validate()?;
        enqueue(&self.orders_tx, request)
    }

    /// Validate and queue a single fragment for delivery.
    pub fn open_order_fragment(&self, route: FragmentRoute) -> Result<(), IngressError> {
        route.validate()?;
        enqueue(&self.fragments_tx, route)
    }

    /// Replace the cached darknode set with the registry's current view.
    pub async fn sync(&self) -> Result<usize, IngressError> {
        let darknodes = self
            .registry
            .darknodes()
            .await
            .map_err(|e| IngressError::Registry(e.to_string()))?;
        let count = darknodes.len();
        self.darknodes.store(Arc::new(darknodes.into_iter().collect()));
        metrics::record_darknode_count(count);
        info!(darknodes = count, "Synchronised darknode registry");
        Ok(count)
    }

    pub fn darknode_count(&self) -> usize {
        self.darknodes.load().len()
    }

    pub fn ledger_address(&self) -> Address {
        self.ledger.address()
    }

    pub fn registry_address(&self) -> Address {
        self.registry.address()
    }

    /// Spawn the order process. Can only be started once; later calls
    /// return an already-closed stream.
    pub fn open_order_process(self: &Arc<Self>, shutdown: Shutdown) -> ErrorStream {
        let (errors, stream) = ErrorStream::channel(Pipeline::Orders);
        let Some(rx) = take_receiver(&self.orders_rx) else {
            debug!("Order process already started");
            return stream;
        };

        let ingress = Arc::clone(self);
        tokio::spawn(async move {
            ingress
                .run(rx, shutdown, errors, |ingress, request| async move {
                    ingress.process_open_order(request).await
                })
                .await;
        });
        stream
    }

    /// Spawn the fragment process. Same start-once rule as
    /// [`open_order_process`](Self::open_order_process).
    pub fn open_order_fragments_process(self: &Arc<Self>, shutdown: Shutdown) -> ErrorStream {
        let (errors, stream) = ErrorStream::channel(Pipeline::OrderFragments);
        let Some(rx) = take_receiver(&self.fragments_rx) else {
            debug!("Fragment process already started");
            return stream;
        };

        let ingress = Arc::clone(self);
        tokio::spawn(async move {
            ingress
                .run(rx, shutdown, errors, |ingress, route| async move {
                    ingress.process_fragment(route).await
                })
                .await;
        });
        stream
    }

    /// Receive items until shutdown, reporting failures on `errors`.
    /// Shutdown also cancels the item in flight. Dropping `errors` on
    /// return closes the stream.
    async fn run<T, F, Fut>(
        self: Arc<Self>,
        mut rx: mpsc::Receiver<T>,
        shutdown: Shutdown,
        errors: ErrorSender,
        mut handle: F,
    ) -> usize
    where
        F: FnMut(Arc<Self>, T) -> Fut,
        Fut: std::future::Future<Output = Result<(), IngressError>>,
    {
        let pipeline = errors.pipeline();
        let mut abandoned = 0;
        loop {
            let item = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = rx.recv() => match next {
                    Some(item) => item,
                    None => break,
                },
            };
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    abandoned += 1;
                    break;
                }
                result = handle(Arc::clone(&self), item) => {
                    if let Err(e) = result {
                        errors.send(e);
                    }
                }
            }
        }

        rx.close();
        while rx.try_recv().is_ok() {
            abandoned += 1;
        }
        if abandoned > 0 {
            warn!(pipeline = %pipeline, discarded = abandoned, "Process stopped with unprocessed items");
        } else {
            debug!(pipeline = %pipeline, "Process stopped");
        }
        abandoned
    }

    async fn process_open_order(&self, request: OpenOrderRequest) -> Result<(), IngressError> {
        let tx = self
            .ledger
            .open_order(request.order_id, request.signature.clone())
            .await
            .map_err(|e| IngressError::Ledger {
                order_id: request.order_id,
                reason: e.to_string(),
            })?;
        debug!(order = %request.order_id, tx = %tx, "Order opened");

        for route in request.order_fragment_mappings {
            self.fragments_tx
                .send(route)
                .await
                .map_err(|_| IngressError::Stopped)?;
        }
        Ok(())
    }

    async fn process_fragment(&self, route: FragmentRoute) -> Result<(), IngressError> {
        let darknode = route.darknode;
        self.ensure_registered(darknode).await?;

        let peer = self
            .swarmer
            .query(darknode)
            .await
            .map_err(|e| IngressError::Delivery {
                darknode,
                fragment: route.fragment.id,
                reason: e.to_string(),
            })?
            .ok_or(IngressError::UnknownDarknode(darknode))?;

        self.orderbook
            .open_order_fragment(&peer, &route.fragment)
            .await
            .map_err(|e| IngressError::Delivery {
                darknode,
                fragment: route.fragment.id,
                reason: e.to_string(),
            })?;
        debug!(darknode = %darknode, fragment = %route.fragment.id, "Fragment delivered");
        Ok(())
    }

    async fn ensure_registered(&self, darknode: Address) -> Result<(), IngressError> {
        if self.darknodes.load().contains(&darknode) {
            return Ok(());
        }
        let registered = self
            .registry
            .is_registered(darknode)
            .await
            .map_err(|e| IngressError::Registry(e.to_string()))?;
        if !registered {
            return Err(IngressError::UnregisteredDarknode(darknode));
        }
        self.darknodes.rcu(|current| {
            let mut next = HashSet::clone(current);
            next.insert(darknode);
            next
        });
        Ok(())
    }
}
