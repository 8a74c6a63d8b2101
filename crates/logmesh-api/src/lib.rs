//! LogMesh API - wire models and request/response definitions
//!
//! This crate provides:
//! - Peer node, node state, and service availability models
//! - The payload envelope and request/response models for cross-node calls
//! - Log entry and query models
//! - The acceptance/decline status of the file-request handshake

pub mod logdata;
pub mod model;
pub mod remote;

// Re-export commonly used types
pub use model::*;
