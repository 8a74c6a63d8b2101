//! Common API models and constants
//!
//! Peer node identity, node state, service kinds, and the availability
//! tri-state returned by probes.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

// Default ports and protocol bounds
pub const DEFAULT_MAIN_PORT: u16 = 8648;

/// Name of the per-node delivery queue that transfer payloads are pushed to.
pub const TRANSFER_QUEUE: &str = "logmesh-transfer";

/// Upper bound on the number of log entries carried in one synchronous reply.
/// Larger results go through the file-transfer side channel instead.
pub const MAX_LOG_EVENT_BATCH: usize = 1000;

/// Node lifecycle state as observed by the cluster layer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeState {
    Starting,
    #[default]
    Up,
    Suspicious,
    Down,
}

impl NodeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeState::Starting => "STARTING",
            NodeState::Up => "UP",
            NodeState::Suspicious => "SUSPICIOUS",
            NodeState::Down => "DOWN",
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self, NodeState::Up)
    }
}

impl Display for NodeState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NodeState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STARTING" => Ok(NodeState::Starting),
            "UP" => Ok(NodeState::Up),
            "SUSPICIOUS" => Ok(NodeState::Suspicious),
            "DOWN" => Ok(NodeState::Down),
            _ => Err(format!("Invalid node state: {}", s)),
        }
    }
}

/// Result of probing a (node, service) pair.
///
/// Probed fresh before every call and never cached beyond that call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceAvailability {
    #[default]
    Unknown,
    Available,
    Unavailable,
}

impl ServiceAvailability {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceAvailability::Unknown => "UNKNOWN",
            ServiceAvailability::Available => "AVAILABLE",
            ServiceAvailability::Unavailable => "UNAVAILABLE",
        }
    }
}

impl Display for ServiceAvailability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Remotable services a node can expose
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceKind {
    /// Log query and log-database file requests
    LogData,
    /// Delivery-queue ingress for pushed transfer payloads
    Transfer,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::LogData => "log-data",
            ServiceKind::Transfer => "transfer",
        }
    }
}

impl Display for ServiceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "log-data" => Ok(ServiceKind::LogData),
            "transfer" => Ok(ServiceKind::Transfer),
            _ => Err(format!("Invalid service kind: {}", s)),
        }
    }
}

/// A peer node in the cluster
///
/// Identity (ip, port, address, name) is immutable once parsed; only
/// `state` changes over the node's lifetime.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerNode {
    pub ip: String,
    pub port: u16,
    /// Routable identifier in `ip:port` form
    pub address: String,
    /// Human-readable name; defaults to the address
    pub name: String,
    pub state: NodeState,
}

/// Builder for [`PeerNode`]
pub struct PeerNodeBuilder {
    ip: String,
    port: u16,
    name: Option<String>,
    state: NodeState,
}

impl PeerNodeBuilder {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
            name: None,
            state: NodeState::default(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn state(mut self, state: NodeState) -> Self {
        self.state = state;
        self
    }

    pub fn build(self) -> PeerNode {
        let address = format!("{}:{}", self.ip, self.port);
        PeerNode {
            ip: self.ip,
            port: self.port,
            name: self.name.unwrap_or_else(|| address.clone()),
            address,
            state: self.state,
        }
    }
}
