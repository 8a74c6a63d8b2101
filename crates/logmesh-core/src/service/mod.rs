// Core services for peer, availability, and RPC management

pub mod cluster;
pub mod log_data;
pub mod registry;
pub mod remote;
pub mod transport;

// Re-export commonly used types
pub use cluster::PeerManager;
pub use registry::ServiceRegistry;
pub use remote::RemoteCaller;
pub use transport::{ClusterTransport, LocalClusterBus};
