// Log data service, scope-selected at wiring time
// One interface; the local implementation reads the store directly while
// the remote-capable one goes through probe, RPC, and the transfer channel

use std::{fs, path::PathBuf, sync::Arc};

use async_trait::async_trait;

use logmesh_api::logdata::model::{LogEntry, LogQuery};
use logmesh_api::model::ServiceKind;
use logmesh_api::remote::model::{LogQueryRequest, LogQueryResponse};
use logmesh_common::LogMeshError;

use crate::{store::LogStore, transfer::service::FileTransferService};

use super::{cluster::PeerManager, remote::RemoteCaller};

/// The logical log-data service, independent of where it executes
#[async_trait]
pub trait LogDataService: Send + Sync {
    async fn get_log_events(&self, query: &LogQuery) -> Result<Vec<LogEntry>, LogMeshError>;

    async fn get_log_database(&self) -> Result<Vec<u8>, LogMeshError>;
}

/// Serves log data straight from the local store
pub struct LocalLogDataService {
    store: Arc<LogStore>,
    staging_dir: PathBuf,
}

impl LocalLogDataService {
    pub fn new(store: Arc<LogStore>, staging_dir: PathBuf) -> Self {
        Self { store, staging_dir }
    }
}

#[async_trait]
impl LogDataService for LocalLogDataService {
    async fn get_log_events(&self, query: &LogQuery) -> Result<Vec<LogEntry>, LogMeshError> {
        Ok(self.store.query(query))
    }

    async fn get_log_database(&self) -> Result<Vec<u8>, LogMeshError> {
        // Even the local read works from a snapshot, never the live file.
        let staged = self.store.snapshot_to_temp_file(&self.staging_dir)?;
        let data = fs::read(&staged)?;
        let _ = fs::remove_file(&staged);
        Ok(data)
    }
}

/// Serves log data from a remote peer through the cluster boundary
pub struct RemoteLogDataService {
    target: String,
    peers: Arc<PeerManager>,
    caller: Arc<RemoteCaller>,
    transfer: Arc<FileTransferService>,
}

impl RemoteLogDataService {
    pub fn new(
        target: impl Into<String>,
        peers: Arc<PeerManager>,
        caller: Arc<RemoteCaller>,
        transfer: Arc<FileTransferService>,
    ) -> Self {
        Self {
            target: target.into(),
            peers,
            caller,
            transfer,
        }
    }
}

#[async_trait]
impl LogDataService for RemoteLogDataService {
    async fn get_log_events(&self, query: &LogQuery) -> Result<Vec<LogEntry>, LogMeshError> {
        let node = self.peers.resolve(&self.target).ok_or_else(|| {
            LogMeshError::transport(format!("unknown peer '{}'", self.target))
        })?;

        let request = LogQueryRequest::new(query.clone());
        let reply = self
            .caller
            .call(&node.address, ServiceKind::LogData, request)
            .await?;

        let response = LogQueryResponse::from(&reply);
        if !response.response.is_success() {
            return Err(LogMeshError::transport(response.response.message));
        }

        Ok(response.events)
    }

    async fn get_log_database(&self) -> Result<Vec<u8>, LogMeshError> {
        self.transfer.fetch_log_database(&self.target).await
    }
}
