//! Test harness for multi-node LogMesh scenarios
//!
//! Exposes node builders and transport doubles used by the integration
//! test binaries.

pub mod harness;
