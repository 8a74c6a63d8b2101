// Peer management and address resolution
// Tracks the cluster peer list and maps human-readable names to routable
// addresses

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, warn};

use logmesh_api::model::{NodeState, PeerNode, PeerNodeBuilder};
use logmesh_common::local_ip;

use crate::model::Configuration;

/// Central peer registry for one node
///
/// The peer map is shared (via [`PeerManager::peers`]) with the service
/// registry so availability probes observe the same node states.
#[derive(Clone)]
pub struct PeerManager {
    local_address: String,
    self_node: Arc<PeerNode>,
    peers: Arc<DashMap<String, PeerNode>>,
    /// name -> address, for resolving human-readable identifiers
    names: Arc<DashMap<String, String>>,
    is_standalone: bool,
}

impl std::fmt::Debug for PeerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerManager")
            .field("local_address", &self.local_address)
            .field("is_standalone", &self.is_standalone)
            .field("peer_count", &self.peers.len())
            .finish()
    }
}

impl PeerManager {
    pub fn new(config: &Configuration) -> Self {
        let ip = config.server_ip().unwrap_or_else(local_ip);
        let port = config.server_main_port();
        let local_address = format!("{}:{}", ip, port);
        let is_standalone = config.is_standalone();

        let mut builder = PeerNodeBuilder::new(ip, port);
        if let Some(name) = config.node_name() {
            builder = builder.name(name);
        }
        let self_node = builder.build();

        let peers = Arc::new(DashMap::new());
        let names = Arc::new(DashMap::new());
        peers.insert(local_address.clone(), self_node.clone());
        names.insert(self_node.name.clone(), local_address.clone());

        let manager = Self {
            local_address,
            self_node: Arc::new(self_node),
            peers,
            names,
            is_standalone,
        };

        if !is_standalone {
            for entry in config.peer_list() {
                match Self::parse_peer(&entry, port) {
                    Some(node) => manager.add_peer(node),
                    None => warn!("Ignoring malformed peer entry: {}", entry),
                }
            }
        }

        info!(
            local = %manager.local_address,
            peers = manager.peers.len(),
            standalone = is_standalone,
            "Peer manager initialized"
        );

        manager
    }

    /// Parse a peer entry into a node
    /// Format: `name@ip:port`, `ip:port`, or `ip` (default port)
    fn parse_peer(entry: &str, default_port: u16) -> Option<PeerNode> {
        let (name, addr_part) = match entry.split_once('@') {
            Some((name, rest)) => (Some(name.trim()), rest.trim()),
            None => (None, entry.trim()),
        };

        let (ip, port) = if addr_part.contains(':') {
            let parts: Vec<&str> = addr_part.split(':').collect();
            if parts.len() != 2 {
                return None;
            }
            let port = parts[1].parse::<u16>().ok()?;
            (parts[0].to_string(), port)
        } else {
            (addr_part.to_string(), default_port)
        };

        if ip.is_empty() {
            return None;
        }

        let mut builder = PeerNodeBuilder::new(ip, port);
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            builder = builder.name(name);
        }
        Some(builder.build())
    }

    /// Add or replace a peer
    pub fn add_peer(&self, node: PeerNode) {
        self.names.insert(node.name.clone(), node.address.clone());
        self.peers.insert(node.address.clone(), node);
    }

    /// Remove a peer by address
    pub fn remove_peer(&self, address: &str) {
        if let Some((_, node)) = self.peers.remove(address) {
            self.names.remove(&node.name);
            info!("Removed cluster peer: {}", address);
        }
    }

    /// Resolve a routable address or a human-readable name to a peer
    pub fn resolve(&self, addr_or_name: &str) -> Option<PeerNode> {
        if let Some(node) = self.peers.get(addr_or_name) {
            return Some(node.value().clone());
        }
        self.names
            .get(addr_or_name)
            .and_then(|addr| self.peers.get(addr.value()).map(|e| e.value().clone()))
    }

    /// Get the shared peer map (for wiring to the service registry)
    pub fn peers(&self) -> Arc<DashMap<String, PeerNode>> {
        self.peers.clone()
    }

    /// Get all known peers, self included
    pub fn all_peers(&self) -> Vec<PeerNode> {
        self.peers.iter().map(|e| e.value().clone()).collect()
    }

    /// Get all peers except self
    pub fn remote_peers(&self) -> Vec<PeerNode> {
        self.peers
            .iter()
            .filter(|e| e.key() != &self.local_address)
            .map(|e| e.value().clone())
            .collect()
    }

    /// Update a peer's observed state
    pub fn update_state(&self, address: &str, state: NodeState) {
        if let Some(mut node) = self.peers.get_mut(address) {
            let previous = node.state;
            node.state = state;
            if previous != state {
                info!(%address, from = %previous, to = %state, "Peer state changed");
            }
        }
    }

    pub fn get(&self, address: &str) -> Option<PeerNode> {
        self.peers.get(address).map(|e| e.value().clone())
    }

    pub fn local_address(&self) -> &str {
        &self.local_address
    }

    pub fn self_node(&self) -> &PeerNode {
        &self.self_node
    }

    pub fn is_self(&self, address: &str) -> bool {
        address == self.local_address
    }

    pub fn is_standalone(&self) -> bool {
        self.is_standalone
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(pairs: &[(&str, &str)]) -> Configuration {
        let mut builder = config::Config::builder()
            .set_default("logmesh.server.ip", "10.0.0.1")
            .unwrap();
        for (key, value) in pairs {
            builder = builder.set_default(*key, *value).unwrap();
        }
        Configuration::from_config(builder.build().unwrap())
    }

    #[test]
    fn test_parse_peer_formats() {
        let node = PeerManager::parse_peer("10.0.0.2:9000", 8648).unwrap();
        assert_eq!(node.address, "10.0.0.2:9000");
        assert_eq!(node.name, "10.0.0.2:9000");

        let node = PeerManager::parse_peer("logs-b@10.0.0.3:8648", 8648).unwrap();
        assert_eq!(node.address, "10.0.0.3:8648");
        assert_eq!(node.name, "logs-b");

        let node = PeerManager::parse_peer("10.0.0.4", 8648).unwrap();
        assert_eq!(node.address, "10.0.0.4:8648");

        assert!(PeerManager::parse_peer("", 8648).is_none());
        assert!(PeerManager::parse_peer("a:b:c", 8648).is_none());
        assert!(PeerManager::parse_peer("10.0.0.5:notaport", 8648).is_none());
    }

    #[test]
    fn test_resolve_by_name_and_address() {
        let config = test_config(&[(
            "logmesh.peer.list",
            "logs-b@10.0.0.2:8648,10.0.0.3:8648",
        )]);
        let manager = PeerManager::new(&config);

        assert_eq!(manager.peer_count(), 3);
        assert_eq!(
            manager.resolve("logs-b").unwrap().address,
            "10.0.0.2:8648"
        );
        assert_eq!(
            manager.resolve("10.0.0.3:8648").unwrap().address,
            "10.0.0.3:8648"
        );
        assert!(manager.resolve("nope").is_none());
    }

    #[test]
    fn test_remote_peers_excludes_self() {
        let config = test_config(&[("logmesh.peer.list", "10.0.0.2:8648")]);
        let manager = PeerManager::new(&config);

        let remotes = manager.remote_peers();
        assert_eq!(remotes.len(), 1);
        assert_eq!(remotes[0].address, "10.0.0.2:8648");
        assert!(manager.is_self("10.0.0.1:8648"));
    }

    #[test]
    fn test_update_state() {
        let config = test_config(&[("logmesh.peer.list", "10.0.0.2:8648")]);
        let manager = PeerManager::new(&config);

        manager.update_state("10.0.0.2:8648", NodeState::Down);
        assert_eq!(
            manager.get("10.0.0.2:8648").unwrap().state,
            NodeState::Down
        );
    }

    #[test]
    fn test_standalone_skips_peer_list() {
        let config = test_config(&[
            ("logmesh.standalone", "true"),
            ("logmesh.peer.list", "10.0.0.2:8648"),
        ]);
        let manager = PeerManager::new(&config);
        assert_eq!(manager.peer_count(), 1);
    }
}
