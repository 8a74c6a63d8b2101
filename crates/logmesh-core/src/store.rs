// Local append-only log store
// One JSON-lines file per node plus an in-memory index; the cross-node
// core only ever reads it through query results or a staged snapshot

use std::{
    fs::{self, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
    sync::RwLock,
};

use tracing::warn;

use logmesh_api::logdata::model::{LogEntry, LogQuery};
use logmesh_common::LogMeshError;

use crate::transfer::staging;

/// Append-only log database
pub struct LogStore {
    path: PathBuf,
    entries: RwLock<Vec<LogEntry>>,
}

impl LogStore {
    /// Open a store, creating the backing file if it does not exist.
    ///
    /// Existing lines are loaded into the in-memory index; lines that fail
    /// to parse are skipped, never rewritten — the file is append-only.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LogMeshError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        let mut entries = Vec::new();
        for line in BufReader::new(&file).lines().map_while(Result::ok) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<LogEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(error) => {
                    warn!(path = %path.display(), %error, "Skipping unparseable log line");
                }
            }
        }

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Append one entry to the store and its backing file
    pub fn append(&self, entry: LogEntry) -> Result<(), LogMeshError> {
        let line = serde_json::to_string(&entry)?;

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;
        entries.push(entry);

        Ok(())
    }

    /// Return entries matching the query bounds
    ///
    /// No match yields an empty list, never an error.
    pub fn query(&self, query: &LogQuery) -> Vec<LogEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|entry| query.matches(entry.timestamp))
            .cloned()
            .collect()
    }

    /// Stage a consistent snapshot of the backing file for transfer
    ///
    /// Holding the read side of the index lock blocks appends (which take
    /// the write side) for the duration of the copy.
    pub fn snapshot_to_temp_file(&self, staging_dir: &Path) -> Result<PathBuf, LogMeshError> {
        let _entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        staging::stage_copy(&self.path, staging_dir)
    }

    pub fn file_path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logmesh_api::logdata::model::LogLevel;

    fn entry(timestamp: i64) -> LogEntry {
        LogEntry::new(LogLevel::Info, "test", timestamp, format!("at {timestamp}"))
    }

    fn store_with(timestamps: &[i64]) -> (tempfile::TempDir, LogStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::open(dir.path().join("logmesh.db")).unwrap();
        for &ts in timestamps {
            store.append(entry(ts)).unwrap();
        }
        (dir, store)
    }

    #[test]
    fn test_query_no_bounds_returns_everything() {
        let (_dir, store) = store_with(&[10, 20, 30]);
        assert_eq!(store.query(&LogQuery::all()).len(), 3);
    }

    #[test]
    fn test_query_empty_store_is_empty_not_error() {
        let (_dir, store) = store_with(&[]);
        assert!(store.query(&LogQuery::all()).is_empty());
        assert!(store.query(&LogQuery::newer_than(0)).is_empty());
    }

    #[test]
    fn test_query_newer_than_is_strict() {
        let (_dir, store) = store_with(&[10, 20, 30]);
        let hits = store.query(&LogQuery::newer_than(20));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].timestamp, 30);
    }

    #[test]
    fn test_query_both_bounds_strictly_between() {
        let (_dir, store) = store_with(&[10, 20, 30, 40]);
        let hits = store.query(&LogQuery::between(10, 40));
        let timestamps: Vec<i64> = hits.iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![20, 30]);
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logmesh.db");
        {
            let store = LogStore::open(&path).unwrap();
            store.append(entry(1)).unwrap();
            store.append(entry(2)).unwrap();
        }
        let reopened = LogStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_open_preserves_foreign_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logmesh.db");
        fs::write(&path, b"not json\n").unwrap();

        let store = LogStore::open(&path).unwrap();
        assert!(store.is_empty());
        // The backing file is append-only; opening must not rewrite it.
        assert_eq!(fs::read(&path).unwrap(), b"not json\n");
    }

    #[test]
    fn test_snapshot_matches_backing_file() {
        let (dir, store) = store_with(&[1, 2]);
        let staged = store
            .snapshot_to_temp_file(&dir.path().join("staging"))
            .unwrap();
        assert_eq!(
            fs::read(&staged).unwrap(),
            fs::read(store.file_path()).unwrap()
        );
    }
}
