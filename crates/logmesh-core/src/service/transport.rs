// Cluster transport boundary
// The call layer and the delivery queue are consumed through this trait so
// the core never depends on a concrete wire protocol

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use logmesh_api::remote::model::{Payload, TransferPayload};
use logmesh_common::LogMeshError;

use crate::handler::HandlerRegistry;
use std::sync::Arc;

/// Boundary to the rest of the cluster
///
/// `dispatch` is the synchronous request/reply path (callers bound it with
/// their own deadline); `enqueue` is fire-and-forget delivery into a named
/// queue on the target node, consumed by that node's push handler.
#[async_trait]
pub trait ClusterTransport: Send + Sync {
    async fn dispatch(&self, address: &str, payload: Payload) -> Result<Payload, LogMeshError>;

    async fn enqueue(
        &self,
        address: &str,
        queue: &str,
        payload: TransferPayload,
    ) -> Result<(), LogMeshError>;
}

struct BusEndpoint {
    handlers: Arc<HandlerRegistry>,
    queues: DashMap<String, UnboundedSender<TransferPayload>>,
}

/// In-process transport connecting every node registered on it
///
/// Standalone deployments and multi-node tests run on this; wire protocols
/// implement [`ClusterTransport`] behind the same seam.
#[derive(Default)]
pub struct LocalClusterBus {
    endpoints: DashMap<String, BusEndpoint>,
}

impl LocalClusterBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a node's handler registry under its routable address
    pub fn register_node(&self, address: &str, handlers: Arc<HandlerRegistry>) {
        self.endpoints.insert(
            address.to_string(),
            BusEndpoint {
                handlers,
                queues: DashMap::new(),
            },
        );
        debug!("Registered bus endpoint for {}", address);
    }

    /// Attach a named delivery queue to an already registered node
    pub fn register_queue(
        &self,
        address: &str,
        queue: &str,
        sender: UnboundedSender<TransferPayload>,
    ) -> Result<(), LogMeshError> {
        let endpoint = self.endpoints.get(address).ok_or_else(|| {
            LogMeshError::transport(format!("no bus endpoint for node '{}'", address))
        })?;
        endpoint.queues.insert(queue.to_string(), sender);
        Ok(())
    }

    pub fn deregister_node(&self, address: &str) {
        self.endpoints.remove(address);
    }
}

#[async_trait]
impl ClusterTransport for LocalClusterBus {
    async fn dispatch(&self, address: &str, payload: Payload) -> Result<Payload, LogMeshError> {
        // Clone the handler registry out so no map guard is held across the
        // handler's await point.
        let handlers = self
            .endpoints
            .get(address)
            .map(|e| e.handlers.clone())
            .ok_or_else(|| {
                LogMeshError::transport(format!("no route to node '{}'", address))
            })?;

        handlers.handle(&payload).await
    }

    async fn enqueue(
        &self,
        address: &str,
        queue: &str,
        payload: TransferPayload,
    ) -> Result<(), LogMeshError> {
        let sender = self
            .endpoints
            .get(address)
            .and_then(|e| e.queues.get(queue).map(|q| q.value().clone()))
            .ok_or_else(|| {
                LogMeshError::transport(format!(
                    "no delivery queue '{}' on node '{}'",
                    queue, address
                ))
            })?;

        sender.send(payload).map_err(|_| {
            LogMeshError::transport(format!(
                "delivery queue '{}' on node '{}' is closed",
                queue, address
            ))
        })
    }
}
