//! Unsolicited push-upload scenarios: the file rides inside the request

use std::{fs, sync::Arc};

use logmesh_api::logdata::model::{LogEntry, LogLevel};
use logmesh_core::service::transport::LocalClusterBus;

use logmesh_integration_tests::harness::bootstrap_node;

#[tokio::test]
async fn push_stores_file_on_receiver_and_reports_size() {
    let bus = Arc::new(LocalClusterBus::new());
    let (_dir_a, node_a) = bootstrap_node(&bus, "10.0.0.1", "10.0.0.2:8648");
    let (dir_b, node_b) = bootstrap_node(&bus, "10.0.0.2", "10.0.0.1:8648");

    node_a
        .append_log(LogEntry::new(LogLevel::Error, "disk", 99, "raid degraded"))
        .unwrap();
    let expected = fs::read(node_a.store().file_path()).unwrap();

    let message = node_a.push_log_database("10.0.0.2:8648").await.unwrap();
    assert_eq!(
        message,
        format!("stored {} bytes from 10.0.0.1:8648", expected.len())
    );

    // No pending entry is ever involved in the push variant.
    assert_eq!(node_a.transfer().pending_count(), 0);
    assert_eq!(node_b.transfer().pending_count(), 0);

    // The receiver materialized the bytes under its incoming staging area.
    let incoming = dir_b.path().join("staging").join("incoming");
    let stored: Vec<_> = fs::read_dir(&incoming)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(stored.len(), 1);
    assert_eq!(fs::read(&stored[0]).unwrap(), expected);
}
