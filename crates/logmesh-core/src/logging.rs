//! File-based logging setup.
//!
//! Components write to separate rolling log files with daily rotation:
//!
//! | Log File      | Component                       | Target Prefixes          |
//! |---------------|---------------------------------|--------------------------|
//! | logmesh.log   | Root logger (all components)    | (all)                    |
//! | cluster.log   | Peer/registry/RPC layer         | logmesh_core::service    |
//! | transfer.log  | File transfer and push handlers | logmesh_core::transfer, logmesh_core::handler |
//!
//! Override the default level with `RUST_LOG`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    filter::{LevelFilter, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Internal definition for a component log file.
struct ComponentLogDef {
    file_name: &'static str,
    /// Target module prefixes routed to this file
    targets: &'static [&'static str],
}

const COMPONENT_LOGS: &[ComponentLogDef] = &[
    ComponentLogDef {
        file_name: "cluster.log",
        targets: &["logmesh_core::service"],
    },
    ComponentLogDef {
        file_name: "transfer.log",
        targets: &["logmesh_core::transfer", "logmesh_core::handler"],
    },
];

/// Initialize per-component rolling file logging under `log_dir`.
///
/// Returns the worker guards; dropping them flushes and stops the
/// background writers, so keep them alive for the process lifetime.
pub fn init_file_logging(log_dir: &Path) -> anyhow::Result<Vec<WorkerGuard>> {
    let mut guards = Vec::new();
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    layers.push(env_filter.boxed());

    // Root file captures every event regardless of target.
    let root_appender = tracing_appender::rolling::daily(log_dir, "logmesh.log");
    let (root_writer, guard) = tracing_appender::non_blocking(root_appender);
    guards.push(guard);
    layers.push(fmt::layer().with_writer(root_writer).with_ansi(false).boxed());

    for def in COMPONENT_LOGS {
        let appender = tracing_appender::rolling::daily(log_dir, def.file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);

        let mut targets = Targets::new();
        for target in def.targets {
            targets = targets.with_target(*target, LevelFilter::DEBUG);
        }

        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(targets)
                .boxed(),
        );
    }

    Registry::default().with(layers).try_init()?;

    Ok(guards)
}

/// Plain stdout logging for tests and development. Safe to call more than
/// once; only the first initialization wins.
pub fn init_stdout_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}
