// Node assembly
// Wires configuration, peer state, the call layer, the transfer machinery,
// and the handler registry into one node attached to a transport

use std::{collections::BTreeMap, fs, sync::Arc};

use tokio::sync::mpsc;
use tracing::info;

use logmesh_api::logdata::model::{LogEntry, LogQuery};
use logmesh_api::model::{ServiceKind, TRANSFER_QUEUE};
use logmesh_common::LogMeshError;

use crate::{
    handler::{
        HandlerRegistry, file_push::FilePushHandler, file_request::FileRequestHandler,
        log_query::LogQueryHandler, transfer::spawn_delivery_consumer,
    },
    model::Configuration,
    service::{
        cluster::PeerManager,
        log_data::{LocalLogDataService, LogDataService, RemoteLogDataService},
        registry::ServiceRegistry,
        remote::RemoteCaller,
        transport::{ClusterTransport, LocalClusterBus},
    },
    store::LogStore,
    transfer::{pending::PendingTransferTable, service::FileTransferService},
};

/// One LogMesh node
pub struct LogMeshNode {
    config: Configuration,
    peers: Arc<PeerManager>,
    registry: Arc<ServiceRegistry>,
    caller: Arc<RemoteCaller>,
    transfer: Arc<FileTransferService>,
    store: Arc<LogStore>,
    handlers: Arc<HandlerRegistry>,
}

impl LogMeshNode {
    /// Build a node and attach it to the bus.
    ///
    /// Must run inside a tokio runtime: the delivery-queue consumer task is
    /// spawned here.
    pub fn bootstrap(
        config: Configuration,
        bus: Arc<LocalClusterBus>,
    ) -> Result<Arc<Self>, LogMeshError> {
        let peers = Arc::new(PeerManager::new(&config));

        // Every configured peer is assumed to expose the full service set;
        // the probe verdict then tracks the observed node state.
        let registry = Arc::new(ServiceRegistry::new(peers.peers()));
        for node in peers.all_peers() {
            registry.register(&node.address, ServiceKind::LogData);
            registry.register(&node.address, ServiceKind::Transfer);
        }

        let data_dir = config.data_dir();
        fs::create_dir_all(&data_dir)?;
        let store = Arc::new(LogStore::open(data_dir.join("logmesh.db"))?);
        let staging_dir = data_dir.join("staging");

        let transport: Arc<dyn ClusterTransport> = bus.clone();
        let caller = Arc::new(RemoteCaller::new(
            registry.clone(),
            transport.clone(),
            config.rpc_timeout(),
        ));

        let transfer = Arc::new(FileTransferService::new(
            peers.clone(),
            caller.clone(),
            Arc::new(PendingTransferTable::new()),
            transport,
            store.clone(),
            staging_dir,
            config.transfer_timeout(),
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

        bus.register_node(peers.local_address(), handlers.clone());

        let (sender, receiver) = mpsc::unbounded_channel();
        bus.register_queue(peers.local_address(), TRANSFER_QUEUE, sender)?;
        spawn_delivery_consumer(transfer.clone(), receiver);

        info!(
            local = %peers.local_address(),
            peers = peers.peer_count(),
            "Node bootstrapped"
        );

        Ok(Arc::new(Self {
            config,
            peers,
            registry,
            caller,
            transfer,
            store,
            handlers,
        }))
    }

    /// Pick the log-data service implementation for a scope: local for this
    /// node's own data, remote-capable for a peer.
    pub fn log_data_service(&self, target: Option<&str>) -> Arc<dyn LogDataService> {
        match target {
            None => Arc::new(LocalLogDataService::new(
                self.store.clone(),
                self.config.data_dir().join("staging"),
            )),
            Some(target) => Arc::new(RemoteLogDataService::new(
                target,
                self.peers.clone(),
                self.caller.clone(),
                self.transfer.clone(),
            )),
        }
    }

    /// Append an entry to the local log database
    pub fn append_log(&self, entry: LogEntry) -> Result<(), LogMeshError> {
        self.store.append(entry)
    }

    /// Query the local store
    pub fn get_log_events(&self, query: &LogQuery) -> Vec<LogEntry> {
        self.store.query(query)
    }

    /// Query a bounded batch of log entries from one peer
    pub async fn fetch_log_events(
        &self,
        target: &str,
        query: &LogQuery,
    ) -> Result<Vec<LogEntry>, LogMeshError> {
        self.log_data_service(Some(target))
            .get_log_events(query)
            .await
    }

    /// Query every remote peer, recording per-node failures
    ///
    /// Unavailable nodes are skipped by the call layer and show up as
    /// errors in the map; they never abort the batch and an absent result
    /// is never passed off as an empty success.
    pub async fn fetch_log_events_all(
        &self,
        query: &LogQuery,
    ) -> BTreeMap<String, Result<Vec<LogEntry>, LogMeshError>> {
        let mut results = BTreeMap::new();
        for node in self.peers.remote_peers() {
            let outcome = self.fetch_log_events(&node.address, query).await;
            results.insert(node.address, outcome);
        }
        results
    }

    /// Fetch the full log database file from one peer
    pub async fn fetch_log_database(&self, target: &str) -> Result<Vec<u8>, LogMeshError> {
        self.log_data_service(Some(target)).get_log_database().await
    }

    /// Fetch the log database from every remote peer concurrently
    pub async fn fetch_log_database_all(
        &self,
    ) -> BTreeMap<String, Result<Vec<u8>, LogMeshError>> {
        let mut handles = Vec::new();
        for node in self.peers.remote_peers() {
            let address = node.address.clone();
            let service = RemoteLogDataService::new(
                address.clone(),
                self.peers.clone(),
                self.caller.clone(),
                self.transfer.clone(),
            );
            handles.push(tokio::spawn(async move {
                let outcome = service.get_log_database().await;
                (address, outcome)
            }));
        }

        let mut results = BTreeMap::new();
        for handle in handles {
            if let Ok((address, outcome)) = handle.await {
                results.insert(address, outcome);
            }
        }
        results
    }

    /// Upload the local log database to a peer
    pub async fn push_log_database(&self, target: &str) -> Result<String, LogMeshError> {
        self.transfer.push_log_database(target).await
    }

    pub fn local_address(&self) -> &str {
        self.peers.local_address()
    }

    pub fn peers(&self) -> &Arc<PeerManager> {
        &self.peers
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    pub fn transfer(&self) -> &Arc<FileTransferService> {
        &self.transfer
    }

    pub fn store(&self) -> &Arc<LogStore> {
        &self.store
    }

    pub fn handlers(&self) -> &Arc<HandlerRegistry> {
        &self.handlers
    }
}
