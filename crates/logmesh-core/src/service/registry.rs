// Service registry and availability probe
// Answers "is service X currently reachable on node Y" without side effects

use std::{collections::HashSet, sync::Arc};

use dashmap::DashMap;

use logmesh_api::model::{PeerNode, ServiceAvailability, ServiceKind};

/// Tracks which services each node exposes and derives availability from
/// the shared peer map.
///
/// `probe` is pure observation. Results are computed fresh per call and
/// must not be cached by callers beyond the call they gate.
pub struct ServiceRegistry {
    peers: Arc<DashMap<String, PeerNode>>,
    services: DashMap<String, HashSet<ServiceKind>>,
}

impl ServiceRegistry {
    pub fn new(peers: Arc<DashMap<String, PeerNode>>) -> Self {
        Self {
            peers,
            services: DashMap::new(),
        }
    }

    /// Record that `address` exposes `kind`
    pub fn register(&self, address: &str, kind: ServiceKind) {
        self.services
            .entry(address.to_string())
            .or_default()
            .insert(kind);
    }

    /// Remove a service registration
    pub fn deregister(&self, address: &str, kind: ServiceKind) {
        if let Some(mut entry) = self.services.get_mut(address) {
            entry.remove(&kind);
        }
    }

    /// Probe availability of a (node, service) pair
    ///
    /// `Unknown` when the node was never seen at all; `Available` when the
    /// service is registered and the node is up; `Unavailable` otherwise.
    pub fn probe(&self, address: &str, kind: ServiceKind) -> ServiceAvailability {
        let node = self.peers.get(address).map(|e| e.value().state);
        let registered = self
            .services
            .get(address)
            .map(|e| e.contains(&kind))
            .unwrap_or(false);

        match node {
            None if !registered => ServiceAvailability::Unknown,
            Some(state) if registered && state.is_up() => ServiceAvailability::Available,
            _ => ServiceAvailability::Unavailable,
        }
    }
}
