// Correlation-based asynchronous file transfer
// The requester registers a pending entry, asks the owning node to stage
// and push its log database, then blocks on the completion handle; the
// synchronous reply only ever carries the acceptance status

use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use tracing::{debug, info, warn};

use logmesh_api::model::{ServiceKind, TRANSFER_QUEUE};
use logmesh_api::remote::model::{
    AcceptStatus, FilePushRequest, FilePushResponse, FileRequest, FileRequestResponse,
    TransferPayload,
};
use logmesh_common::LogMeshError;

use crate::{
    service::{cluster::PeerManager, remote::RemoteCaller, transport::ClusterTransport},
    store::LogStore,
    transfer::{pending::PendingTransferTable, staging},
};

/// File egress/ingress for one node
pub struct FileTransferService {
    local_address: String,
    peers: Arc<PeerManager>,
    caller: Arc<RemoteCaller>,
    table: Arc<PendingTransferTable>,
    transport: Arc<dyn ClusterTransport>,
    store: Arc<LogStore>,
    staging_dir: PathBuf,
    transfer_timeout: Duration,
}

impl FileTransferService {
    pub fn new(
        peers: Arc<PeerManager>,
        caller: Arc<RemoteCaller>,
        table: Arc<PendingTransferTable>,
        transport: Arc<dyn ClusterTransport>,
        store: Arc<LogStore>,
        staging_dir: PathBuf,
        transfer_timeout: Duration,
    ) -> Self {
        Self {
            local_address: peers.local_address().to_string(),
            peers,
            caller,
            table,
            transport,
            store,
            staging_dir,
            transfer_timeout,
        }
    }

    /// Fetch the full log database from a peer
    ///
    /// Two-phase: a bounded synchronous request that the remote answers
    /// with accept/decline only, then a long independent wait for the
    /// pushed file. The pending entry is released on every exit path.
    pub async fn fetch_log_database(&self, target: &str) -> Result<Vec<u8>, LogMeshError> {
        let node = self.peers.resolve(target).ok_or_else(|| {
            LogMeshError::transport(format!("unknown peer '{}'", target))
        })?;

        // Register before sending: a reply can then never beat the entry.
        let (correlation_id, receiver) = self.table.register();

        let request = FileRequest::new(self.local_address.clone(), correlation_id);
        let reply = match self
            .caller
            .call(&node.address, ServiceKind::LogData, request)
            .await
        {
            Ok(reply) => reply,
            Err(error) => {
                self.table.remove(correlation_id);
                return Err(error);
            }
        };

        let response = FileRequestResponse::from(&reply);
        if let AcceptStatus::Declined(reason) = response.accept_status() {
            self.table.remove(correlation_id);
            return Err(LogMeshError::RemoteDeclined { reason });
        }

        debug!(
            node = %node.address,
            correlation_id,
            "File request accepted, awaiting push delivery"
        );

        // The wait holds no lock over the table; only the oneshot handle.
        match tokio::time::timeout(self.transfer_timeout, receiver).await {
            Ok(Ok(Ok(path))) => {
                let data = tokio::fs::read(&path).await?;
                if let Err(error) = tokio::fs::remove_file(&path).await {
                    warn!(path = %path.display(), %error, "Failed to clean delivered file");
                }
                info!(
                    node = %node.address,
                    correlation_id,
                    bytes = data.len(),
                    "Log database received"
                );
                Ok(data)
            }
            Ok(Ok(Err(reason))) => {
                // Failed through the handle itself; the entry is already gone.
                Err(LogMeshError::Io(std::io::Error::other(reason)))
            }
            Ok(Err(_closed)) => {
                self.table.remove(correlation_id);
                Err(LogMeshError::transport(
                    "transfer cancelled before completion",
                ))
            }
            Err(_elapsed) => {
                self.table.remove(correlation_id);
                Err(LogMeshError::TransferTimeout {
                    correlation_id,
                    elapsed_ms: self.transfer_timeout.as_millis() as u64,
                })
            }
        }
    }

    /// File-owning side of the two-phase protocol
    ///
    /// Runs behind an RPC boundary, so every failure degrades to a decline
    /// with a readable reason instead of an error.
    pub async fn handle_file_request(
        &self,
        requester_address: &str,
        correlation_id: u64,
    ) -> AcceptStatus {
        let staged = match self.store.snapshot_to_temp_file(&self.staging_dir) {
            Ok(path) => path,
            Err(error) => {
                return AcceptStatus::declined(format!("staging failed: {}", error));
            }
        };

        let Some(node) = self.peers.resolve(requester_address) else {
            let _ = fs::remove_file(&staged);
            return AcceptStatus::declined(format!(
                "unknown requester node: {}",
                requester_address
            ));
        };

        let data = match fs::read(&staged) {
            Ok(data) => data,
            Err(error) => {
                let _ = fs::remove_file(&staged);
                return AcceptStatus::declined(format!("staging failed: {}", error));
            }
        };
        let _ = fs::remove_file(&staged);

        let payload = TransferPayload {
            correlation_id,
            file_name: format!("logdb-{}.snapshot", correlation_id),
            data,
            source: self.local_address.clone(),
        };

        // Acceptance covers the enqueue handoff only, never the delivery.
        match self
            .transport
            .enqueue(&node.address, TRANSFER_QUEUE, payload)
            .await
        {
            Ok(()) => {
                info!(
                    requester = %node.address,
                    correlation_id,
                    "Staged log database enqueued for delivery"
                );
                AcceptStatus::Accepted
            }
            Err(error) => AcceptStatus::declined(format!("enqueue failed: {}", error)),
        }
    }

    /// Push-handler body: invoked for every payload drained from this
    /// node's delivery queue, on whatever thread the consumer runs on.
    ///
    /// Deliveries with no matching entry are dropped silently; this is the
    /// at-most-once consumption edge of the protocol and never raises.
    pub async fn on_delivery(&self, payload: TransferPayload) {
        let correlation_id = payload.correlation_id;

        if !self.table.contains(correlation_id) {
            debug!(
                correlation_id,
                source = %payload.source,
                "Delivery for unknown correlation id, dropping"
            );
            return;
        }

        let path = match staging::write_staged(&payload.data, &self.staging_dir) {
            Ok(path) => path,
            Err(error) => {
                self.table
                    .fail(correlation_id, format!("failed to materialize delivery: {}", error));
                return;
            }
        };

        if !self.table.resolve(correlation_id, path.clone()) {
            // Entry vanished between the contains check and the resolve
            // (caller timed out); drop the orphaned file.
            let _ = fs::remove_file(&path);
            debug!(correlation_id, "Entry released mid-delivery, dropped");
        }
    }

    /// Unsolicited upload of the local log database to a peer
    ///
    /// The bytes ride inside the request, so the ordinary RPC bound applies
    /// and no pending entry exists at any point.
    pub async fn push_log_database(&self, target: &str) -> Result<String, LogMeshError> {
        let node = self.peers.resolve(target).ok_or_else(|| {
            LogMeshError::transport(format!("unknown peer '{}'", target))
        })?;

        let staged = self.store.snapshot_to_temp_file(&self.staging_dir)?;
        let data = fs::read(&staged)?;
        let _ = fs::remove_file(&staged);

        let file_name = format!("logdb-from-{}.snapshot", self.local_address);
        let request = FilePushRequest::new(file_name, data, self.local_address.clone());

        let reply = self
            .caller
            .call(&node.address, ServiceKind::LogData, request)
            .await?;
        let response = FilePushResponse::from(&reply);
        if !response.response.is_success() {
            return Err(LogMeshError::transport(response.response.message));
        }

        Ok(response.message)
    }

    /// Receiving side of the unsolicited upload
    pub fn handle_file_push(&self, request: &FilePushRequest) -> Result<String, LogMeshError> {
        let incoming_dir = self.staging_dir.join("incoming");
        let path = staging::write_staged(&request.data, &incoming_dir)?;

        info!(
            source = %request.source,
            file = %request.file_name,
            bytes = request.data.len(),
            stored = %path.display(),
            "Stored pushed log database"
        );

        Ok(format!(
            "stored {} bytes from {}",
            request.data.len(),
            request.source
        ))
    }

    pub fn pending_count(&self) -> usize {
        self.table.len()
    }

    pub fn table(&self) -> &Arc<PendingTransferTable> {
        &self.table
    }

    pub fn staging_dir(&self) -> &PathBuf {
        &self.staging_dir
    }
}
