//! LogMesh Common - Shared errors, constants, and utilities
//!
//! This crate provides the foundational pieces used across all LogMesh
//! components:
//! - Error types with the full cross-node failure taxonomy
//! - Utility functions
//! - Default protocol bounds

pub mod error;
pub mod utils;

// Re-exports for convenience
pub use error::LogMeshError;
pub use utils::{is_valid, local_ip};

/// Default bound for a synchronous RPC round trip, acceptance included.
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 60_000;

/// Default bound for physically moving a file between nodes. Independent of
/// the RPC bound: a large file takes far longer than a status round trip.
pub const DEFAULT_TRANSFER_TIMEOUT_MS: u64 = 600_000;
