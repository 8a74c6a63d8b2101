//! Builders and transport doubles for wiring multi-node scenarios on the
//! in-process bus.

use std::{
    fs,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::mpsc;

use logmesh_api::model::{ServiceKind, TRANSFER_QUEUE};
use logmesh_api::remote::model::{Payload, TransferPayload};
use logmesh_common::LogMeshError;

use logmesh_core::{
    handler::{
        HandlerRegistry, file_push::FilePushHandler, file_request::FileRequestHandler,
        log_query::LogQueryHandler, transfer::spawn_delivery_consumer,
    },
    model::Configuration,
    service::{
        cluster::PeerManager, registry::ServiceRegistry, remote::RemoteCaller,
        transport::{ClusterTransport, LocalClusterBus},
    },
    store::LogStore,
    transfer::{pending::PendingTransferTable, service::FileTransferService},
    node::LogMeshNode,
};

/// Knobs for hand-wired nodes
pub struct NodeOptions {
    /// First correlation id the node's table issues
    pub first_correlation_id: u64,
    pub transfer_timeout_ms: u64,
    /// Raw bytes written to the log database file before the store opens
    pub raw_db: Option<Vec<u8>>,
    /// Transport override for this node's outbound traffic
    pub transport: Option<Arc<dyn ClusterTransport>>,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            first_correlation_id: 1,
            transfer_timeout_ms: 600_000,
            raw_db: None,
            transport: None,
        }
    }
}

/// A hand-assembled node with every component reachable from the test
pub struct TestNode {
    pub peers: Arc<PeerManager>,
    pub registry: Arc<ServiceRegistry>,
    pub caller: Arc<RemoteCaller>,
    pub table: Arc<PendingTransferTable>,
    pub transfer: Arc<FileTransferService>,
    pub store: Arc<LogStore>,
    pub handlers: Arc<HandlerRegistry>,
    pub address: String,
    pub staging_dir: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

fn node_config(ip: &str, peer_list: &str, data_dir: &std::path::Path) -> Configuration {
    Configuration::from_config(
        config::Config::builder()
            .set_default("logmesh.server.ip", ip)
            .unwrap()
            .set_default("logmesh.peer.list", peer_list)
            .unwrap()
            .set_default("logmesh.data.dir", data_dir.to_str().unwrap())
            .unwrap()
            .build()
            .unwrap(),
    )
}

/// Wire a node by hand onto the bus, with full control over its table and
/// transport. Must run inside a tokio runtime.
pub fn manual_node(
    bus: &Arc<LocalClusterBus>,
    ip: &str,
    peer_list: &str,
    options: NodeOptions,
) -> TestNode {
    logmesh_core::logging::init_stdout_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = node_config(ip, peer_list, dir.path());

    let peers = Arc::new(PeerManager::new(&config));
    let registry = Arc::new(ServiceRegistry::new(peers.peers()));
    for node in peers.all_peers() {
        registry.register(&node.address, ServiceKind::LogData);
        registry.register(&node.address, ServiceKind::Transfer);
    }

    let db_path = dir.path().join("logmesh.db");
    if let Some(raw) = &options.raw_db {
        fs::write(&db_path, raw).unwrap();
    }
    let store = Arc::new(LogStore::open(&db_path).unwrap());
    let staging_dir = dir.path().join("staging");

    let transport: Arc<dyn ClusterTransport> =
        options.transport.unwrap_or_else(|| bus.clone() as Arc<dyn ClusterTransport>);
    let caller = Arc::new(RemoteCaller::new(
        registry.clone(),
        transport.clone(),
        Duration::from_secs(60),
    ));
    let table = Arc::new(PendingTransferTable::starting_at(
        options.first_correlation_id,
    ));

    let transfer = Arc::new(FileTransferService::new(
        peers.clone(),
        caller.clone(),
        table.clone(),
        transport,
        store.clone(),
        staging_dir.clone(),
        Duration::from_millis(options.transfer_timeout_ms),
    ));

    let handlers = Arc::new(HandlerRegistry::new());
    handlers.register(Arc::new(LogQueryHandler {
        store: store.clone(),
    }));
    handlers.register(Arc::new(FileRequestHandler {
        transfer: transfer.clone(),
    }));
    handlers.register(Arc::new(FilePushHandler {
        transfer: transfer.clone(),
    }));

    let address = peers.local_address().to_string();
    bus.register_node(&address, handlers.clone());

    let (sender, receiver) = mpsc::unbounded_channel();
    bus.register_queue(&address, TRANSFER_QUEUE, sender).unwrap();
    spawn_delivery_consumer(transfer.clone(), receiver);

    TestNode {
        peers,
        registry,
        caller,
        table,
        transfer,
        store,
        handlers,
        address,
        staging_dir,
        _dir: dir,
    }
}

/// Bootstrap a full node through the production assembly path
pub fn bootstrap_node(
    bus: &Arc<LocalClusterBus>,
    ip: &str,
    peer_list: &str,
) -> (tempfile::TempDir, Arc<LogMeshNode>) {
    logmesh_core::logging::init_stdout_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = node_config(ip, peer_list, dir.path());
    let node = LogMeshNode::bootstrap(config, bus.clone()).unwrap();
    (dir, node)
}

/// Transport wrapper that forwards dispatches but parks every enqueue
/// until the test releases it.
pub struct HoldingTransport {
    inner: Arc<LocalClusterBus>,
    held: Mutex<Vec<(String, String, TransferPayload)>>,
}

impl HoldingTransport {
    pub fn new(inner: Arc<LocalClusterBus>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            held: Mutex::new(Vec::new()),
        })
    }

    /// Forward every held payload to the real bus
    pub async fn release_all(&self) {
        let held: Vec<_> = self.held.lock().unwrap().drain(..).collect();
        for (address, queue, payload) in held {
            let _ = self.inner.enqueue(&address, &queue, payload).await;
        }
    }

    pub fn held_count(&self) -> usize {
        self.held.lock().unwrap().len()
    }
}

#[async_trait]
impl ClusterTransport for HoldingTransport {
    async fn dispatch(&self, address: &str, payload: Payload) -> Result<Payload, LogMeshError> {
        self.inner.dispatch(address, payload).await
    }

    async fn enqueue(
        &self,
        address: &str,
        queue: &str,
        payload: TransferPayload,
    ) -> Result<(), LogMeshError> {
        self.held
            .lock()
            .unwrap()
            .push((address.to_string(), queue.to_string(), payload));
        Ok(())
    }
}

/// Wait until `predicate` holds or the deadline passes
pub async fn wait_until(deadline: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    predicate()
}
