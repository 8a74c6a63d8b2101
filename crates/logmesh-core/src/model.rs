// Core configuration model
// Thin typed wrapper around the config crate with documented defaults

use std::{path::PathBuf, time::Duration};

use logmesh_api::model::DEFAULT_MAIN_PORT;
use logmesh_common::{DEFAULT_RPC_TIMEOUT_MS, DEFAULT_TRANSFER_TIMEOUT_MS};

/// Application configuration
#[derive(Clone, Debug)]
pub struct Configuration {
    pub config: config::Config,
}

impl Configuration {
    /// Create a new configuration from a Config instance
    pub fn from_config(config: config::Config) -> Self {
        Self { config }
    }

    /// Get the main server port
    pub fn server_main_port(&self) -> u16 {
        self.config
            .get_int("logmesh.server.main.port")
            .unwrap_or(DEFAULT_MAIN_PORT as i64) as u16
    }

    /// Get the bind/advertise IP; falls back to interface discovery
    pub fn server_ip(&self) -> Option<String> {
        self.config.get_string("logmesh.server.ip").ok()
    }

    /// Get the human-readable node name; defaults to the local address
    pub fn node_name(&self) -> Option<String> {
        self.config.get_string("logmesh.node.name").ok()
    }

    /// Check if running in standalone mode (no peers expected)
    pub fn is_standalone(&self) -> bool {
        self.config.get_bool("logmesh.standalone").unwrap_or(false)
    }

    /// Get the configured peer list
    ///
    /// Comma separated entries, each `ip:port`, `ip`, or `name@ip:port`.
    pub fn peer_list(&self) -> Vec<String> {
        self.config
            .get_string("logmesh.peer.list")
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the RPC timeout bounding a synchronous call (default: 60s)
    pub fn rpc_timeout(&self) -> Duration {
        let ms = self
            .config
            .get_int("logmesh.rpc.timeout.ms")
            .unwrap_or(DEFAULT_RPC_TIMEOUT_MS as i64) as u64;
        Duration::from_millis(ms)
    }

    /// Get the transfer timeout bounding physical file movement
    /// (default: 10 minutes, independent of the RPC bound)
    pub fn transfer_timeout(&self) -> Duration {
        let ms = self
            .config
            .get_int("logmesh.transfer.timeout.ms")
            .unwrap_or(DEFAULT_TRANSFER_TIMEOUT_MS as i64) as u64;
        Duration::from_millis(ms)
    }

    /// Get the node data directory (log database, staging area)
    pub fn data_dir(&self) -> PathBuf {
        self.config
            .get_string("logmesh.data.dir")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"))
    }

    /// Get the directory rolling log files are written to
    pub fn log_dir(&self) -> PathBuf {
        self.config
            .get_string("logmesh.logs.dir")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("logs"))
    }
}
