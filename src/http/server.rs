//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, timeout, request ID)
//! - Bind server to listener and stop on shutdown

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use axum::{
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestSpan};
use crate::identity::MultiAddress;
use crate::ingress::Ingress;
use crate::lifecycle::{BootstrapOutcome, Shutdown, Stage};
use crate::swarm::client::{PING_PATH, QUERY_PATH};
use crate::swarm::Swarmer;

/// Identity and contract facts reported by `/status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub address: MultiAddress,
    pub ethereum_address: Address,
    pub registry: Address,
    pub ledger: Address,
    pub stage: Stage,
    pub bootstrap: BootstrapOutcome,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub ingress: Arc<Ingress>,
    pub swarmer: Arc<Swarmer>,
    pub node: Arc<NodeInfo>,
}

/// Public API server.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState, config: &ServerConfig) -> Self {
        Self {
            router: Self::build_router(state, config),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, config: &ServerConfig) -> Router {
        Router::new()
            .route("/orders", post(handlers::open_order))
            .route("/orders/fragments", post(handlers::open_order_fragment))
            .route("/status", get(handlers::status))
            .route("/health", get(handlers::health))
            .route("/peers", get(handlers::peers))
            .route(PING_PATH, post(handlers::swarm_ping))
            .route(QUERY_PATH, post(handlers::swarm_query))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
            .layer(set_request_id_layer())
    }

    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve until `shutdown` fires, then finish in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
