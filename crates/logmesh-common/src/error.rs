//! Error types for LogMesh
//!
//! Every cross-node failure mode has its own variant so callers can tell a
//! probe refusal from an RPC deadline from a transfer that never arrived.

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum LogMeshError {
    /// Probe reported the service down on the target node. Non-fatal in
    /// batch operations: the node is skipped and recorded.
    #[error("service '{service}' is unavailable on node '{node}'")]
    ServiceUnavailable { node: String, service: String },

    /// A bounded synchronous call exceeded its deadline. The caller decides
    /// whether to retry.
    #[error("rpc to node '{node}' timed out after {elapsed_ms}ms")]
    RpcTimeout { node: String, elapsed_ms: u64 },

    /// A file transfer did not complete within the long transfer bound.
    /// The pending-transfer entry is released before this is surfaced.
    #[error("transfer {correlation_id} did not complete within {elapsed_ms}ms")]
    TransferTimeout { correlation_id: u64, elapsed_ms: u64 },

    /// The remote side explicitly refused the request. No implied retry.
    #[error("remote declined: {reason}")]
    RemoteDeclined { reason: String },

    /// Connectivity or routing fault unrelated to timing.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl LogMeshError {
    /// True for failures a batch operation records per node and keeps going.
    pub fn is_node_local(&self) -> bool {
        matches!(
            self,
            LogMeshError::ServiceUnavailable { .. }
                | LogMeshError::RpcTimeout { .. }
                | LogMeshError::TransferTimeout { .. }
                | LogMeshError::RemoteDeclined { .. }
        )
    }

    pub fn transport(message: impl Into<String>) -> Self {
        LogMeshError::Transport(message.into())
    }

    pub fn declined(reason: impl Into<String>) -> Self {
        LogMeshError::RemoteDeclined {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LogMeshError::ServiceUnavailable {
            node: "10.0.0.2:8648".to_string(),
            service: "log-data".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "service 'log-data' is unavailable on node '10.0.0.2:8648'"
        );

        let err = LogMeshError::RpcTimeout {
            node: "10.0.0.2:8648".to_string(),
            elapsed_ms: 60_000,
        };
        assert_eq!(
            format!("{}", err),
            "rpc to node '10.0.0.2:8648' timed out after 60000ms"
        );

        let err = LogMeshError::declined("no such file");
        assert_eq!(format!("{}", err), "remote declined: no such file");
    }

    #[test]
    fn test_is_node_local() {
        assert!(
            LogMeshError::RemoteDeclined {
                reason: "busy".to_string()
            }
            .is_node_local()
        );
        assert!(
            LogMeshError::TransferTimeout {
                correlation_id: 7,
                elapsed_ms: 1
            }
            .is_node_local()
        );
        assert!(!LogMeshError::transport("broken pipe").is_node_local());
        assert!(!LogMeshError::Config("missing port".to_string()).is_node_local());
    }
}
