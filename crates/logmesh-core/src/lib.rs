//! LogMesh Core - cluster, RPC, and file-transfer machinery
//!
//! This crate provides:
//! - Peer management and address resolution
//! - The service registry and availability probe
//! - The bounded synchronous RPC call layer
//! - The pending-transfer table and correlation-based file transfer
//! - The local append-only log store
//! - Payload handler dispatch and node assembly

pub mod handler;
pub mod logging;
pub mod model;
pub mod node;
pub mod service;
pub mod store;
pub mod transfer;

// Re-export commonly used types
pub use model::Configuration;
pub use node::LogMeshNode;
pub use service::{ClusterTransport, LocalClusterBus, PeerManager, RemoteCaller, ServiceRegistry};
pub use store::LogStore;
pub use transfer::{FileTransferService, PendingTransferTable};

// Re-export common functions
pub use logmesh_common::local_ip;
