// Pending-transfer table
// The sole mutable state shared between requester threads, the timeout
// path, and the push handler; every mutation is atomic through the map

use std::{
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::debug;

/// What the push side eventually signals: a local path on success, a
/// reason string on failure. Only a value signaled through this handle is
/// ever trusted; partial file state is never exposed.
pub type TransferOutcome = Result<PathBuf, String>;

/// One in-flight transfer awaiting its push delivery
pub struct PendingTransfer {
    sender: oneshot::Sender<TransferOutcome>,
    pub created_at: i64,
}

/// Concurrent map from correlation id to in-flight completion handle
///
/// Ids come from a process-wide monotonic counter, so no two live entries
/// ever share one. An entry is registered before its triggering RPC is
/// sent and removed on every exit path: resolution, cancellation, or the
/// caller's timeout. Resolving removes the entry first, so each id is
/// completed at most once and late deliveries find nothing to touch.
pub struct PendingTransferTable {
    entries: DashMap<u64, PendingTransfer>,
    next_id: AtomicU64,
}

impl Default for PendingTransferTable {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl PendingTransferTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start issuing correlation ids from `first_id`
    pub fn starting_at(first_id: u64) -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(first_id),
        }
    }

    /// Issue a fresh correlation id and register its entry
    ///
    /// Registration happens before the caller sends any request, so a
    /// reply can never race an absent entry.
    pub fn register(&self) -> (u64, oneshot::Receiver<TransferOutcome>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = oneshot::channel();
        let created_at = chrono::Utc::now().timestamp_millis();
        self.entries.insert(id, PendingTransfer { sender, created_at });
        (id, receiver)
    }

    /// Complete a transfer with the delivered local path
    ///
    /// Returns false (and does nothing) when the id is unknown: the entry
    /// already timed out, was cancelled, or this is a duplicate delivery.
    pub fn resolve(&self, id: u64, path: PathBuf) -> bool {
        match self.entries.remove(&id) {
            Some((_, entry)) => {
                // A dropped receiver means the caller is already gone; the
                // entry is released either way.
                let _ = entry.sender.send(Ok(path));
                true
            }
            None => {
                debug!("No pending transfer for correlation id {}, dropping", id);
                false
            }
        }
    }

    /// Complete a transfer with a failure reason
    pub fn fail(&self, id: u64, reason: impl Into<String>) -> bool {
        match self.entries.remove(&id) {
            Some((_, entry)) => {
                let _ = entry.sender.send(Err(reason.into()));
                true
            }
            None => false,
        }
    }

    /// Cancel and remove an entry without completing it
    ///
    /// Dropping the sender wakes the waiting receiver with a recv error.
    pub fn remove(&self, id: u64) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
