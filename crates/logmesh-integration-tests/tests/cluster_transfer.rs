//! Multi-node file-transfer scenarios over the in-process bus

use std::{fs, sync::Arc, time::Duration};

use logmesh_api::remote::model::TransferPayload;
use logmesh_common::LogMeshError;
use logmesh_core::service::transport::{ClusterTransport, LocalClusterBus};

use logmesh_integration_tests::harness::{
    HoldingTransport, NodeOptions, manual_node, wait_until,
};

const FILE_CONTENT: &[u8] = b"hello world test\n";

#[tokio::test]
async fn round_trip_delivers_exact_bytes_and_releases_entry() {
    let bus = Arc::new(LocalClusterBus::new());

    let requester = manual_node(
        &bus,
        "10.0.0.1",
        "owner@10.0.0.2:8648",
        NodeOptions {
            first_correlation_id: 42,
            ..Default::default()
        },
    );
    let owner = manual_node(
        &bus,
        "10.0.0.2",
        "10.0.0.1:8648",
        NodeOptions {
            raw_db: Some(FILE_CONTENT.to_vec()),
            ..Default::default()
        },
    );

    assert_eq!(FILE_CONTENT.len(), 17);
    assert_eq!(fs::read(owner.store.file_path()).unwrap(), FILE_CONTENT);

    // Resolution by human-readable name, transfer by correlation id 42.
    let data = requester.transfer.fetch_log_database("owner").await.unwrap();

    assert_eq!(data, FILE_CONTENT);
    assert!(!requester.table.contains(42));
    assert!(requester.table.is_empty());
}

#[tokio::test]
async fn timeout_releases_entry_and_late_push_is_dropped() {
    let bus = Arc::new(LocalClusterBus::new());
    let holding = HoldingTransport::new(bus.clone());

    let requester = manual_node(
        &bus,
        "10.0.0.1",
        "10.0.0.2:8648",
        NodeOptions {
            transfer_timeout_ms: 100,
            ..Default::default()
        },
    );
    // The owner accepts but its delivery is parked in the holding transport.
    let _owner = manual_node(
        &bus,
        "10.0.0.2",
        "10.0.0.1:8648",
        NodeOptions {
            transport: Some(holding.clone()),
            ..Default::default()
        },
    );

    let result = requester.transfer.fetch_log_database("10.0.0.2:8648").await;
    match result {
        Err(LogMeshError::TransferTimeout { correlation_id, .. }) => {
            assert_eq!(correlation_id, 1);
        }
        other => panic!("expected TransferTimeout, got {:?}", other.err()),
    }
    assert!(requester.table.is_empty());
    assert_eq!(holding.held_count(), 1);

    // Deliver the parked payload long after the caller gave up.
    holding.release_all().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Dropped without effect: no entry resurrected, nothing materialized.
    assert!(requester.table.is_empty());
    assert!(!requester.staging_dir.exists());
}

#[tokio::test]
async fn out_of_order_completions_have_no_cross_talk() {
    let bus = Arc::new(LocalClusterBus::new());
    let holding = HoldingTransport::new(bus.clone());

    let requester = manual_node(
        &bus,
        "10.0.0.1",
        "slow@10.0.0.2:8648,fast@10.0.0.3:8648",
        NodeOptions::default(),
    );
    let _slow = manual_node(
        &bus,
        "10.0.0.2",
        "10.0.0.1:8648",
        NodeOptions {
            raw_db: Some(b"slow node database\n".to_vec()),
            transport: Some(holding.clone()),
            ..Default::default()
        },
    );
    let _fast = manual_node(
        &bus,
        "10.0.0.3",
        "10.0.0.1:8648",
        NodeOptions {
            raw_db: Some(b"fast node database\n".to_vec()),
            ..Default::default()
        },
    );

    // First request goes to the slow node (id 1), second to the fast one
    // (id 2); id 2 completes first.
    let slow_fetch = {
        let transfer = requester.transfer.clone();
        tokio::spawn(async move { transfer.fetch_log_database("slow").await })
    };
    assert!(
        wait_until(Duration::from_secs(1), || holding.held_count() == 1).await,
        "slow node's delivery never got parked"
    );

    let fast_fetch = {
        let transfer = requester.transfer.clone();
        tokio::spawn(async move { transfer.fetch_log_database("fast").await })
    };

    let fast_data = fast_fetch.await.unwrap().unwrap();
    assert_eq!(fast_data, b"fast node database\n");

    holding.release_all().await;
    let slow_data = slow_fetch.await.unwrap().unwrap();
    assert_eq!(slow_data, b"slow node database\n");

    assert!(requester.table.is_empty());
}

#[tokio::test]
async fn delivery_for_unknown_id_is_silently_discarded() {
    let bus = Arc::new(LocalClusterBus::new());
    let requester = manual_node(&bus, "10.0.0.1", "", NodeOptions::default());

    // Push straight into the requester's queue with no matching entry.
    bus.enqueue(
        &requester.address,
        logmesh_api::model::TRANSFER_QUEUE,
        TransferPayload {
            correlation_id: 7,
            file_name: "stray.snapshot".to_string(),
            data: b"stray".to_vec(),
            source: "10.0.0.9:8648".to_string(),
        },
    )
    .await
    .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(requester.table.is_empty());
    assert!(!requester.staging_dir.exists());
}
