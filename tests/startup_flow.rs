//! End-to-end startup orchestration with in-memory collaborators.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use ingress_node::blockchain::BlockchainError;
use ingress_node::lifecycle::{BootstrapOutcome, Dependencies, Orchestrator, Stage};
use ingress_node::NodeError;

mod common;
use common::*;

const LATER_STAGES: [Stage; 3] = [Stage::IngestionStarted, Stage::Bootstrapping, Stage::Serving];

#[tokio::test]
async fn test_resolves_documented_address_and_serves() {
    let fixture = NodeFixture::new(18514);
    let deps = memory_deps("203.0.113.5\n", MemoryBinder::new(MemoryLedger::default()), ScriptedTransport::default());

    let node = Orchestrator::new(fixture.env.clone(), deps).start().await.unwrap();

    assert_eq!(
        node.address().to_string(),
        format!("/ip4/203.0.113.5/tcp/18514/republic/{}", NODE_ADDRESS)
    );
    assert_eq!(node.stage(), Stage::Serving);
    assert_eq!(
        node.history(),
        &[
            Stage::Loading,
            Stage::IdentityResolved,
            Stage::ContractsBound,
            Stage::OverlayConstructed,
            Stage::IngestionStarted,
            Stage::Bootstrapping,
            Stage::Serving,
        ]
    );
    assert_eq!(node.bootstrap_outcome(), &BootstrapOutcome::Joined { peers: 0 });
    assert_eq!(node.contracts().auth.from(), NODE_ADDRESS);
    assert_eq!(node.stop().await, 0);
}

#[tokio::test]
async fn test_bootstrap_joins_reachable_seeds() {
    let mut config = base_config();
    config["bootstrapMultiAddresses"] = json!([peer(1).to_string(), peer(2).to_string()]);
    let fixture = NodeFixture::with_config(18514, config);
    let transport = ScriptedTransport {
        reachable: vec![peer(1), peer(2), peer(3)],
        ..Default::default()
    };

    let node = Orchestrator::new(
        fixture.env.clone(),
        memory_deps("10.0.0.200", MemoryBinder::new(MemoryLedger::default()), transport),
    )
    .start()
    .await
    .unwrap();

    assert_eq!(node.bootstrap_outcome(), &BootstrapOutcome::Joined { peers: 3 });
    assert!(node.degraded_stages().is_empty());
    node.stop().await;
}

#[tokio::test]
async fn test_bootstrap_timeout_still_reaches_serving() {
    let mut config = base_config();
    config["bootstrapMultiAddresses"] = json!([peer(1).to_string()]);
    let fixture = NodeFixture::with_config(18514, config);
    let transport = ScriptedTransport {
        reachable: vec![peer(1)],
        hang: true,
        ..Default::default()
    };

    let started = tokio::time::Instant::now();
    let node = Orchestrator::new(
        fixture.env.clone(),
        memory_deps("10.0.0.200", MemoryBinder::new(MemoryLedger::default()), transport),
    )
    .start()
    .await
    .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(node.stage(), Stage::Serving);
    assert!(node.degraded_stages().contains(&Stage::Bootstrapping));
    match node.bootstrap_outcome() {
        BootstrapOutcome::Degraded { peers, reason } => {
            assert_eq!(*peers, 0);
            assert!(reason.contains("did not finish"), "{reason}");
        }
        other => panic!("expected degraded bootstrap, got {other:?}"),
    }
    node.stop().await;
}

#[tokio::test]
async fn test_unreachable_seeds_are_not_fatal() {
    let mut config = base_config();
    config["bootstrapMultiAddresses"] = json!([peer(1).to_string(), peer(2).to_string()]);
    let fixture = NodeFixture::with_config(18514, config);
    let transport = ScriptedTransport {
        reachable: vec![peer(2)],
        ..Default::default()
    };

    let node = Orchestrator::new(
        fixture.env.clone(),
        memory_deps("10.0.0.200", MemoryBinder::new(MemoryLedger::default()), transport),
    )
    .start()
    .await
    .unwrap();

    assert_eq!(node.stage(), Stage::Serving);
    assert!(matches!(
        node.bootstrap_outcome(),
        BootstrapOutcome::Degraded { peers: 1, .. }
    ));
    node.stop().await;
}

#[tokio::test]
async fn test_missing_config_aborts_while_loading() {
    let mut fixture = NodeFixture::new(18514);
    fixture.env.config_path = fixture.dir.path().join("missing.json");

    let err = Orchestrator::new(
        fixture.env.clone(),
        memory_deps("10.0.0.200", MemoryBinder::new(MemoryLedger::default()), ScriptedTransport::default()),
    )
    .start()
    .await
    .unwrap_err();

    assert_eq!(err.stage, Stage::Loading);
    assert_eq!(err.step, "loading config");
    assert!(matches!(err.error, NodeError::ConfigLoad(_)));
    assert_eq!(err.history, vec![Stage::Loading, Stage::Aborted]);
}

#[tokio::test]
async fn test_preloaded_config_is_not_read_again() {
    let fixture = NodeFixture::new(18514);
    let mut orchestrator = Orchestrator::new(
        fixture.env.clone(),
        memory_deps("10.0.0.200", MemoryBinder::new(MemoryLedger::default()), ScriptedTransport::default()),
    );

    let observability = orchestrator.load().unwrap().observability.clone();
    assert!(!observability.metrics_enabled);
    std::fs::remove_file(&fixture.env.config_path).unwrap();

    let node = orchestrator.start().await.unwrap();
    assert_eq!(node.stage(), Stage::Serving);
    node.stop().await;
}

#[tokio::test]
async fn test_empty_ip_lookup_aborts_while_loading() {
    let fixture = NodeFixture::new(18514);

    let err = Orchestrator::new(
        fixture.env.clone(),
        memory_deps("  \n", MemoryBinder::new(MemoryLedger::default()), ScriptedTransport::default()),
    )
    .start()
    .await
    .unwrap_err();

    assert_eq!(err.stage, Stage::Loading);
    assert!(matches!(err.error, NodeError::NetworkDiscovery(_)));
    for stage in LATER_STAGES {
        assert!(!err.history.contains(&stage));
    }
}

#[tokio::test]
async fn test_wrong_keystore_passphrase_aborts() {
    let mut fixture = NodeFixture::new(18514);
    fixture.env.keystore_passphrase = "hunter2".into();

    let err = Orchestrator::new(
        fixture.env.clone(),
        memory_deps("10.0.0.200", MemoryBinder::new(MemoryLedger::default()), ScriptedTransport::default()),
    )
    .start()
    .await
    .unwrap_err();

    // A plaintext record is not a V3 keystore.
    assert_eq!(err.stage, Stage::Loading);
    assert!(matches!(
        err.error,
        NodeError::KeystoreDecrypt(_) | NodeError::KeystoreLoad(_)
    ));
}

#[tokio::test]
async fn test_contract_bind_failure_aborts_after_identity() {
    let fixture = NodeFixture::new(18514);
    let binder = MemoryBinder::failing(|| BlockchainError::ContractBind {
        contract: "ledger",
        reason: "no code at address".into(),
    });

    let err = Orchestrator::new(
        fixture.env.clone(),
        memory_deps("10.0.0.200", binder, ScriptedTransport::default()),
    )
    .start()
    .await
    .unwrap_err();

    assert_eq!(err.stage, Stage::IdentityResolved);
    assert_eq!(err.to_string(), "startup aborted at identity-resolved while binding contracts: cannot bind to ledger: no code at address");
    assert_eq!(err.history.last(), Some(&Stage::Aborted));
    for stage in LATER_STAGES {
        assert!(!err.history.contains(&stage));
    }
}

#[tokio::test]
async fn test_local_network_without_registry_aborts() {
    let mut config = base_config();
    config["ethereum"] = json!({ "networkName": "local" });
    let fixture = NodeFixture::with_config(18514, config);

    // Real binder: fails while resolving the registry, before dialing.
    let deps = Dependencies::default()
        .with_ip_lookup(Arc::new(FixedLookup("10.0.0.200")))
        .with_transport(Arc::new(ScriptedTransport::default()));

    let err = Orchestrator::new(fixture.env.clone(), deps).start().await.unwrap_err();
    assert_eq!(err.stage, Stage::IdentityResolved);
    assert!(matches!(err.error, NodeError::NoDefaultAddress(ref network) if network == "local"));
}

#[tokio::test]
async fn test_unreachable_rpc_aborts() {
    let mut config = base_config();
    config["ethereum"]["rpcURI"] = json!("http://127.0.0.1:1");
    config["ethereum"]["rpcTimeoutSecs"] = json!(1);
    let fixture = NodeFixture::with_config(18514, config);

    let deps = Dependencies::default()
        .with_ip_lookup(Arc::new(FixedLookup("10.0.0.200")))
        .with_transport(Arc::new(ScriptedTransport::default()));

    let err = Orchestrator::new(fixture.env.clone(), deps).start().await.unwrap_err();
    assert!(matches!(err.error, NodeError::Connection(_)));
    assert!(err.error.is_fatal());
}

#[tokio::test]
async fn test_three_ingestion_errors_drained_before_close() {
    let fixture = NodeFixture::new(18514);
    let binder = MemoryBinder::new(MemoryLedger {
        fail: true,
        ..Default::default()
    });
    let ledger = binder.ledger.clone();

    let node = Orchestrator::new(
        fixture.env.clone(),
        memory_deps("10.0.0.200", binder, ScriptedTransport::default()),
    )
    .start()
    .await
    .unwrap();

    for seed in 1..=3 {
        node.ingress().open_order(order(seed, &[9])).unwrap();
    }
    assert!(wait_until(Duration::from_secs(2), || ledger.calls() == 3).await);

    assert_eq!(node.stop().await, 3);
}

#[tokio::test]
async fn test_stop_interrupts_hanging_ledger_call() {
    let fixture = NodeFixture::new(18514);
    let binder = MemoryBinder::new(MemoryLedger {
        hang: true,
        ..Default::default()
    });
    let ledger = binder.ledger.clone();

    let node = Orchestrator::new(
        fixture.env.clone(),
        memory_deps("10.0.0.200", binder, ScriptedTransport::default()),
    )
    .start()
    .await
    .unwrap();

    node.ingress().open_order(order(1, &[9])).unwrap();
    assert!(wait_until(Duration::from_secs(2), || ledger.calls() == 1).await);
    node.ingress().open_order(order(2, &[9])).unwrap();

    let errors = tokio::time::timeout(Duration::from_secs(3), node.stop())
        .await
        .expect("stop should not wait for the ledger call");
    assert_eq!(errors, 0);
}

#[tokio::test]
async fn test_orders_reach_registered_darknodes() {
    let binder = MemoryBinder::new(MemoryLedger::default());
    binder.registry.darknodes.lock().unwrap().extend([peer(1).address(), peer(2).address()]);
    let transport = ScriptedTransport {
        reachable: vec![peer(1), peer(2)],
        ..Default::default()
    };
    let orderbook = transport.orderbook.clone();

    let mut config = base_config();
    config["bootstrapMultiAddresses"] = json!([peer(1).to_string(), peer(2).to_string()]);
    let fixture = NodeFixture::with_config(18514, config);

    let node = Orchestrator::new(fixture.env.clone(), memory_deps("10.0.0.200", binder, transport))
        .start()
        .await
        .unwrap();
    assert_eq!(node.ingress().darknode_count(), 2);

    node.ingress().open_order(order(5, &[1, 2])).unwrap();
    assert!(wait_until(Duration::from_secs(2), || orderbook.delivered.lock().unwrap().len() == 2).await);

    let delivered: Vec<_> = orderbook
        .delivered
        .lock()
        .unwrap()
        .iter()
        .map(|(to, _)| to.address())
        .collect();
    assert!(delivered.contains(&peer(1).address()));
    assert!(delivered.contains(&peer(2).address()));
    assert_eq!(node.stop().await, 0);
}
