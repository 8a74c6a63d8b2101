// Synchronous RPC call layer
// Probes availability, dispatches through the transport, and enforces the
// bounded wait that separates RpcTimeout from plain transport failure

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tracing::warn;

use logmesh_api::model::{ServiceAvailability, ServiceKind};
use logmesh_api::remote::model::{HEADER_SOURCE, Payload, RequestTrait, SOURCE_CLUSTER};
use logmesh_common::LogMeshError;

use super::{registry::ServiceRegistry, transport::ClusterTransport};

/// Bounded synchronous caller used for everything that fits in one reply:
/// log-entry batches and the acceptance handshake of the file protocol.
#[derive(Clone)]
pub struct RemoteCaller {
    registry: Arc<ServiceRegistry>,
    transport: Arc<dyn ClusterTransport>,
    rpc_timeout: Duration,
}

impl RemoteCaller {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        transport: Arc<dyn ClusterTransport>,
        rpc_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            transport,
            rpc_timeout,
        }
    }

    /// Probe availability of a (node, service) pair. Pure observation.
    pub fn probe(&self, address: &str, kind: ServiceKind) -> ServiceAvailability {
        self.registry.probe(address, kind)
    }

    /// Invoke a remote operation and block up to the RPC bound for its reply
    ///
    /// The probe always precedes the dispatch; an `Unavailable` verdict
    /// refuses the call outright without touching the transport.
    pub async fn call<T>(
        &self,
        address: &str,
        kind: ServiceKind,
        request: T,
    ) -> Result<Payload, LogMeshError>
    where
        T: RequestTrait + Serialize + Send + Sync,
    {
        if self.probe(address, kind) == ServiceAvailability::Unavailable {
            return Err(LogMeshError::ServiceUnavailable {
                node: address.to_string(),
                service: kind.to_string(),
            });
        }

        let mut payload = request.to_payload();
        payload
            .metadata
            .headers
            .insert(HEADER_SOURCE.to_string(), SOURCE_CLUSTER.to_string());

        match tokio::time::timeout(self.rpc_timeout, self.transport.dispatch(address, payload))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(LogMeshError::RpcTimeout {
                node: address.to_string(),
                elapsed_ms: self.rpc_timeout.as_millis() as u64,
            }),
        }
    }

    /// Fan a request out to a list of nodes, one task per node
    ///
    /// Per-node failures (unavailable nodes included) are recorded in the
    /// result list; the batch itself never aborts.
    pub async fn call_each<T>(
        &self,
        addresses: &[String],
        kind: ServiceKind,
        request: T,
    ) -> Vec<(String, Result<Payload, LogMeshError>)>
    where
        T: RequestTrait + Serialize + Clone + Send + Sync + 'static,
    {
        let mut handles = Vec::with_capacity(addresses.len());

        for address in addresses {
            let address = address.clone();
            let request = request.clone();
            let caller = self.clone();

            handles.push(tokio::spawn(async move {
                let result = caller.call(&address, kind, request).await;
                if let Err(ref error) = result {
                    warn!(node = %address, %error, "Batch call failed on node");
                }
                (address, result)
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(result) = handle.await {
                results.push(result);
            }
        }

        results
    }

    pub fn rpc_timeout(&self) -> Duration {
        self.rpc_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use logmesh_api::model::{NodeState, PeerNodeBuilder};
    use logmesh_api::remote::model::{Request, TransferPayload};

    /// Transport double that counts dispatches and can stall forever
    struct StubTransport {
        dispatches: AtomicUsize,
        stall: bool,
    }

    impl StubTransport {
        fn new(stall: bool) -> Self {
            Self {
                dispatches: AtomicUsize::new(0),
                stall,
            }
        }
    }

    #[async_trait]
    impl ClusterTransport for StubTransport {
        async fn dispatch(
            &self,
            _address: &str,
            payload: Payload,
        ) -> Result<Payload, LogMeshError> {
            self.dispatches.fetch_add(1, Ordering::SeqCst);
            if self.stall {
                futures::future::pending::<()>().await;
            }
            Ok(payload)
        }

        async fn enqueue(
            &self,
            _address: &str,
            _queue: &str,
            _payload: TransferPayload,
        ) -> Result<(), LogMeshError> {
            Ok(())
        }
    }

    fn registry_with(address: &str, state: NodeState, kind: ServiceKind) -> Arc<ServiceRegistry> {
        let peers = Arc::new(DashMap::new());
        let (ip, port) = address.split_once(':').unwrap();
        peers.insert(
            address.to_string(),
            PeerNodeBuilder::new(ip, port.parse().unwrap())
                .state(state)
                .build(),
        );
        let registry = Arc::new(ServiceRegistry::new(peers));
        registry.register(address, kind);
        registry
    }

    #[tokio::test]
    async fn test_unavailable_node_never_reaches_transport() {
        let address = "10.0.0.2:8648";
        let registry = registry_with(address, NodeState::Down, ServiceKind::LogData);
        let transport = Arc::new(StubTransport::new(false));
        let caller = RemoteCaller::new(
            registry,
            transport.clone(),
            Duration::from_secs(60),
        );

        let result = caller
            .call(address, ServiceKind::LogData, Request::new())
            .await;

        assert!(matches!(
            result,
            Err(LogMeshError::ServiceUnavailable { .. })
        ));
        assert_eq!(transport.dispatches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_call_times_out_distinctly() {
        let address = "10.0.0.2:8648";
        let registry = registry_with(address, NodeState::Up, ServiceKind::LogData);
        let transport = Arc::new(StubTransport::new(true));
        let caller = RemoteCaller::new(registry, transport, Duration::from_millis(20));

        let result = caller
            .call(address, ServiceKind::LogData, Request::new())
            .await;

        assert!(matches!(result, Err(LogMeshError::RpcTimeout { .. })));
    }

    #[tokio::test]
    async fn test_call_each_records_per_node_failures() {
        let up = "10.0.0.2:8648";
        let down = "10.0.0.3:8648";
        let registry = registry_with(up, NodeState::Up, ServiceKind::LogData);
        registry.register(down, ServiceKind::LogData);

        let transport = Arc::new(StubTransport::new(false));
        let caller = RemoteCaller::new(
            registry.clone(),
            transport.clone(),
            Duration::from_secs(60),
        );

        let results = caller
            .call_each(
                &[up.to_string(), down.to_string()],
                ServiceKind::LogData,
                Request::new(),
            )
            .await;

        assert_eq!(results.len(), 2);
        let by_node: std::collections::HashMap<_, _> = results
            .into_iter()
            .map(|(node, result)| (node, result.is_ok()))
            .collect();
        assert!(by_node[up]);
        // `down` was registered but its node is unknown to the peer map,
        // so the probe refuses the call; the batch still completed.
        assert!(!by_node[down]);
        assert_eq!(transport.dispatches.load(Ordering::SeqCst), 1);
    }
}
