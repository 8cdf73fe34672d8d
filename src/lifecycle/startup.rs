//! Startup orchestration.
//!
//! # Responsibilities
//! - Load config and key material, resolve the node's public address
//! - Bind the registry and ledger contracts
//! - Construct the overlay and start ingestion
//! - Bootstrap into the overlay within a deadline
//! - Hand a [`RunningNode`] to the caller, who binds the public listener
//!
//! # Design Decisions
//! - Stages run strictly in order on the calling task
//! - Failures before the overlay exists abort startup
//! - Bootstrap and registry sync failures only degrade the node

use std::sync::Arc;

use axum::Router;
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::blockchain::{ContractBinder, ContractHandles, EthereumBinder, KeyMaterial};
use crate::config::{load_config, NodeConfig, NodeEnv};
use crate::error::NodeError;
use crate::http::{AppState, HttpServer, NodeInfo};
use crate::identity::{resolve_address, HttpIpLookup, IpLookup, MultiAddress};
use crate::ingress::{drain_errors, IngestionSupervisor, Ingress};
use crate::lifecycle::{Shutdown, Stage, StageFailure, StageTracker};
use crate::swarm::{HttpTransport, Overlay, PeerTransport};

/// Collaborators the orchestrator talks to.
///
/// Production defaults come from [`Dependencies::default`]; tests replace
/// individual pieces.
#[derive(Clone)]
pub struct Dependencies {
    /// Public IP lookup. `None` builds an HTTP lookup from config.
    pub ip_lookup: Option<Arc<dyn IpLookup>>,
    pub binder: Arc<dyn ContractBinder>,
    pub transport: Arc<dyn PeerTransport>,
    pub shutdown: Shutdown,
}

impl Default for Dependencies {
    fn default() -> Self {
        Self {
            ip_lookup: None,
            binder: Arc::new(EthereumBinder::default()),
            transport: Arc::new(HttpTransport),
            shutdown: Shutdown::new(),
        }
    }
}

impl Dependencies {
    pub fn with_ip_lookup(mut self, lookup: Arc<dyn IpLookup>) -> Self {
        self.ip_lookup = Some(lookup);
        self
    }

    pub fn with_binder(mut self, binder: Arc<dyn ContractBinder>) -> Self {
        self.binder = binder;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn PeerTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }
}

/// Fatal startup failure.
///
/// `stage` is the last stage reached; `step` names the operation that
/// failed on the way to the next one.
#[derive(Debug, Error)]
#[error("startup aborted at {stage} while {step}: {error}")]
pub struct StartupError {
    pub stage: Stage,
    pub step: &'static str,
    #[source]
    pub error: NodeError,
    pub history: Vec<Stage>,
}

/// How the overlay bootstrap ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum BootstrapOutcome {
    Joined { peers: usize },
    Degraded { peers: usize, reason: String },
}

impl BootstrapOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, BootstrapOutcome::Degraded { .. })
    }
}

/// Drives a node from configuration to `Serving`.
pub struct Orchestrator {
    env: NodeEnv,
    deps: Dependencies,
    config: Option<NodeConfig>,
    tracker: StageTracker,
}

impl Orchestrator {
    pub fn new(env: NodeEnv, deps: Dependencies) -> Self {
        Self {
            env,
            deps,
            config: None,
            tracker: StageTracker::new(),
        }
    }

    /// Load the node config ahead of [`start`](Self::start), which then
    /// reuses it instead of reading the file again.
    pub fn load(&mut self) -> Result<&NodeConfig, StartupError> {
        let config = self.take_config()?;
        Ok(self.config.insert(config))
    }

    fn take_config(&mut self) -> Result<NodeConfig, StartupError> {
        match self.config.take() {
            Some(config) => Ok(config),
            None => load_config(&self.env.config_path).map_err(|e| self.abort("loading config", e.into())),
        }
    }

    pub fn stage(&self) -> Stage {
        self.tracker.current()
    }

    /// Run every stage. On success the node is `Serving` and ingestion is
    /// running; the caller binds the listener and calls [`RunningNode::serve`].
    pub async fn start(mut self) -> Result<RunningNode, StartupError> {
        info!(
            config = %self.env.config_path.display(),
            keystore = %self.env.keystore_path.display(),
            port = %self.env.port,
            "Starting ingress node"
        );

        let config = self.take_config()?;
        let key = KeyMaterial::load(&self.env.keystore_path, &self.env.keystore_passphrase)
            .map_err(|e| self.abort("loading keystore", e.into()))?;
        let lookup: Arc<dyn IpLookup> = match self.deps.ip_lookup.clone() {
            Some(lookup) => lookup,
            None => Arc::new(
                HttpIpLookup::new(&config.identity).map_err(|e| self.abort("resolving address", e.into()))?,
            ),
        };
        let address = resolve_address(&key, &self.env.port, lookup.as_ref())
            .await
            .map_err(|e| self.abort("resolving address", e.into()))?;
        self.advance(Stage::IdentityResolved);
        info!(address = %address, "Resolved node identity");

        let contracts = self
            .deps
            .binder
            .bind(&config.ethereum, &key)
            .await
            .map_err(|e| self.abort("binding contracts", e.into()))?;
        self.advance(Stage::ContractsBound);

        let overlay = Overlay::construct(address, &config.overlay, self.deps.transport.as_ref())
            .map_err(|e| self.abort("constructing overlay", NodeError::OverlayConstruction(e)))?;
        self.advance(Stage::OverlayConstructed);

        let ingress = Arc::new(Ingress::new(
            contracts.registry.clone(),
            contracts.ledger.clone(),
            overlay.swarmer().clone(),
            overlay.orderbook().clone(),
            &config.ingress,
        ));
        let streams = IngestionSupervisor::start(&ingress, &self.deps.shutdown);
        let drains = vec![drain_errors(streams.orders), drain_errors(streams.fragments)];
        self.advance(Stage::IngestionStarted);

        self.advance(Stage::Bootstrapping);
        let bootstrap = match overlay.bootstrap(&config.bootstrap_multi_addresses).await {
            Ok(peers) => BootstrapOutcome::Joined { peers },
            Err(e) => {
                let reason = self.degrade(NodeError::OverlayBootstrap(e));
                BootstrapOutcome::Degraded {
                    peers: overlay.swarmer().table().len(),
                    reason,
                }
            }
        };
        if let Err(e) = ingress.sync().await {
            self.degrade(e.into());
        }

        let peers = overlay.swarmer().peers();
        info!(address = %address, "Address");
        info!(ethereum = %contracts.auth.from(), "Ethereum address");
        info!(peers = peers.len(), "Connected to peers");
        for peer in &peers {
            info!(peer = %peer, "Peer");
        }

        self.advance(Stage::Serving);

        Ok(RunningNode {
            config,
            address,
            contracts,
            overlay,
            ingress,
            tracker: self.tracker,
            bootstrap,
            shutdown: self.deps.shutdown,
            drains,
        })
    }

    fn advance(&mut self, to: Stage) {
        if let Err(e) = self.tracker.advance(to) {
            error!(error = %e, "Stage machine out of order");
        }
    }

    fn abort(&mut self, step: &'static str, error: NodeError) -> StartupError {
        let stage = self.tracker.current();
        let failure = StageFailure::classify(stage, error);
        if let Err(e) = self.tracker.record_failure(&failure) {
            error!(error = %e, "Stage machine out of order");
        }
        let (StageFailure::Fatal { error, .. } | StageFailure::Degraded { error, .. }) = failure;
        StartupError {
            stage,
            step,
            error,
            history: self.tracker.history().to_vec(),
        }
    }

    /// Record a non-fatal failure and return its description.
    fn degrade(&mut self, error: NodeError) -> String {
        let failure = StageFailure::classify(self.tracker.current(), error);
        warn!(stage = %failure.stage(), error = %failure.error(), "Continuing in degraded mode");
        if let Err(e) = self.tracker.record_failure(&failure) {
            error!(error = %e, "Stage machine out of order");
        }
        failure.error().to_string()
    }
}

/// A node that has reached `Serving`.
pub struct RunningNode {
    config: NodeConfig,
    address: MultiAddress,
    contracts: ContractHandles,
    overlay: Overlay,
    ingress: Arc<Ingress>,
    tracker: StageTracker,
    bootstrap: BootstrapOutcome,
    shutdown: Shutdown,
    drains: Vec<JoinHandle<usize>>,
}

impl std::fmt::Debug for RunningNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningNode").finish_non_exhaustive()
    }
}

impl RunningNode {
    pub fn stage(&self) -> Stage {
        self.tracker.current()
    }

    pub fn history(&self) -> &[Stage] {
        self.tracker.history()
    }

    pub fn degraded_stages(&self) -> &[Stage] {
        self.tracker.degraded()
    }

    pub fn address(&self) -> MultiAddress {
        self.address
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn contracts(&self) -> &ContractHandles {
        &self.contracts
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn ingress(&self) -> &Arc<Ingress> {
        &self.ingress
    }

    pub fn bootstrap_outcome(&self) -> &BootstrapOutcome {
        &self.bootstrap
    }

    fn app_state(&self) -> AppState {
        AppState {
            ingress: self.ingress.clone(),
            swarmer: self.overlay.swarmer().clone(),
            node: Arc::new(NodeInfo {
                address: self.address,
                ethereum_address: self.contracts.auth.from(),
                registry: self.contracts.registry.address(),
                ledger: self.contracts.ledger.address(),
                stage: self.tracker.current(),
                bootstrap: self.bootstrap.clone(),
            }),
        }
    }

    /// Public API router, for serving elsewhere or driving in tests.
    pub fn router(&self) -> Router {
        HttpServer::new(self.app_state(), &self.config.server).into_router()
    }

    /// Serve the public API until `shutdown` fires, then stop ingestion.
    ///
    /// Returns the number of ingestion errors observed over the node's life.
    pub async fn serve(self, listener: TcpListener, shutdown: Shutdown) -> Result<usize, NodeError> {
        let local = listener.local_addr()?;
        info!("listening at {}", local);

        let server = HttpServer::new(self.app_state(), &self.config.server);
        let served = server.run(listener, shutdown).await;

        let errors = self.stop().await;
        served?;
        Ok(errors)
    }

    /// Stop ingestion and wait for both error streams to close.
    pub async fn stop(self) -> usize {
        self.shutdown.trigger();
        let mut errors = 0;
        for drain in self.drains {
            match drain.await {
                Ok(count) => errors += count,
                Err(e) => warn!(error = %e, "Error drain task failed"),
            }
        }
        info!(ingestion_errors = errors, "Ingestion stopped");
        errors
    }
}
