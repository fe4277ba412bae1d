//! Point-in-time snapshots of a `ShardedStore`
//!
//! A snapshot is a plain `shard -> key -> value` map serialized as JSON.
//! Each shard is copied under its own lock, so a snapshot taken while
//! writers are active is consistent per shard but not across shards.
//!
//! Files are written to a sibling temp file first and renamed into place.

use crate::sharded::{Shard, ShardedStore};
use docket_core::{ShardId, StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Snapshot format version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Serializable copy of every non-empty shard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Format version, checked on load
    pub format: u32,
    /// Shard contents keyed by shard name
    pub shards: BTreeMap<ShardId, BTreeMap<String, Value>>,
}

impl StoreSnapshot {
    /// Total number of keys captured
    pub fn key_count(&self) -> usize {
        self.shards.values().map(BTreeMap::len).sum()
    }
}

impl ShardedStore {
    /// Copy the current contents of every shard
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            format: SNAPSHOT_FORMAT_VERSION,
            shards: self
                .export_shards()
                .into_iter()
                .map(|(id, shard)| (id, shard.data))
                .collect(),
        }
    }

    /// Build a store from a snapshot
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Snapshot` if the format version is unknown.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> StorageResult<Self> {
        if snapshot.format != SNAPSHOT_FORMAT_VERSION {
            return Err(StorageError::Snapshot(format!(
                "unsupported snapshot format {} (expected {})",
                snapshot.format, SNAPSHOT_FORMAT_VERSION
            )));
        }
        let store = ShardedStore::with_capacity(snapshot.shards.len());
        for (id, data) in snapshot.shards {
            if !data.is_empty() {
                store.insert_shard(id, Shard { data });
            }
        }
        Ok(store)
    }

    /// Write a snapshot to `path`
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or any file operation fails.
    pub fn save_to_file(&self, path: &Path) -> StorageResult<StoreSnapshot> {
        let snapshot = self.snapshot();
        let bytes = serde_json::to_vec(&snapshot)
            .map_err(|e| StorageError::Snapshot(format!("encode failed: {}", e)))?;

        let tmp = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;

        tracing::info!(
            target: "docket::storage",
            path = %path.display(),
            shards = snapshot.shards.len(),
            keys = snapshot.key_count(),
            "Snapshot written"
        );
        Ok(snapshot)
    }

    /// Load a store from a snapshot file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load_from_file(path: &Path) -> StorageResult<Self> {
        let bytes = fs::read(path)?;
        let snapshot: StoreSnapshot = serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::Snapshot(format!("decode of '{}' failed: {}", path.display(), e))
        })?;
        let keys = snapshot.key_count();
        let store = Self::from_snapshot(snapshot)?;
        tracing::info!(
            target: "docket::storage",
            path = %path.display(),
            shards = store.shard_count(),
            keys,
            "Snapshot loaded"
        );
        Ok(store)
    }

    /// Load from `path` if it exists, otherwise start empty
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub fn open_or_empty(path: &Path) -> StorageResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::new())
        }
    }
}
