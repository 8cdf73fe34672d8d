//! Ingress node.
//!
//! # Architecture Overview
//!
//! ```text
//!   ENV_CONFIG / ENV_KEYSTORE / PORT
//!                │
//!                ▼
//!   ┌───────────────────────── ORCHESTRATOR ─────────────────────────┐
//!   │ config + keystore ─▶ identity ─▶ contracts ─▶ overlay          │
//!   │                      (ip lookup)  (registry,   (table, pool,    │
//!   │                                    ledger)      swarmer)        │
//!   │                                        │            │           │
//!   │                                        ▼            ▼           │
//!   │                                   ingestion ◀── bootstrap       │
//!   │                                   processes     (deadline)      │
//!   └────────────────────────────────────────┬───────────────────────┘
//!                                            ▼
//!                               public API on 0.0.0.0:PORT
//! ```

use std::process::ExitCode;

use tokio::net::TcpListener;

use ingress_node::config::ObservabilityConfig;
use ingress_node::lifecycle::spawn_signal_handler;
use ingress_node::observability::{logging, metrics};
use ingress_node::{Dependencies, NodeEnv, Orchestrator, Shutdown};

#[tokio::main]
async fn main() -> ExitCode {
    let env = NodeEnv::from_env();
    let shutdown = Shutdown::new();
    let deps = Dependencies::default().with_shutdown(shutdown.clone());
    let mut orchestrator = Orchestrator::new(env.clone(), deps);

    let loaded = orchestrator.load().map(|config| config.observability.clone());
    let observability = match &loaded {
        Ok(observability) => observability.clone(),
        Err(_) => ObservabilityConfig::default(),
    };
    logging::init_logging(&observability);

    tracing::info!("ingress-node v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = loaded {
        tracing::error!(stage = %e.stage, step = e.step, "{}", e);
        return ExitCode::FAILURE;
    }

    if observability.metrics_enabled {
        match observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    spawn_signal_handler(shutdown.clone());

    let node = match orchestrator.start().await {
        Ok(node) => node,
        Err(e) => {
            tracing::error!(stage = %e.stage, step = e.step, "{}", e);
            return ExitCode::FAILURE;
        }
    };

    let bind_address = format!("0.0.0.0:{}", env.port);
    let listener = match TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %bind_address, error = %e, "Cannot bind listener");
            node.stop().await;
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = node.serve(listener, shutdown).await {
        tracing::error!(error = %e, "Server failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
