//! Sharded in-memory key-value engine
//!
//! DashMap of shards, each an ordered BTreeMap behind its own mutex.
//!
//! # Design
//!
//! - DashMap: shard lookup without a global lock
//! - BTreeMap: lexicographic key order for deterministic prefix listing
//! - Per-shard Mutex: transactions on one shard are serialized, different
//!   shards never contend
//!
//! # Transactions
//!
//! A transaction holds the shard mutex for its whole body. Writes are staged
//! in a private write set (reads see them) and applied only when the body
//! returns `Ok`. A failing body leaves the shard exactly as it was.

use dashmap::DashMap;
use docket_core::{
    KeyPage, KeyValueStore, Result, ShardId, ShardTransaction, StorageResult,
};
use parking_lot::Mutex;
use rustc_hash::FxHasher;
use serde_json::Value;
use std::collections::BTreeMap;
use std::hash::BuildHasherDefault;
use std::ops::Bound;
use std::sync::Arc;

type FxBuildHasher = BuildHasherDefault<FxHasher>;

/// One shard's data, ordered by key
#[derive(Debug, Default, Clone)]
pub struct Shard {
    pub(crate) data: BTreeMap<String, Value>,
}

impl Shard {
    /// Create a new empty shard
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of keys in this shard
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if shard is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Keys starting with `prefix`, strictly after `start_after`, at most `limit`
    fn scan(&self, prefix: &str, start_after: Option<&str>, limit: Option<usize>) -> KeyPage {
        let lower = match start_after {
            Some(after) if after >= prefix => Bound::Excluded(after),
            _ => Bound::Included(prefix),
        };
        let keys: Vec<String> = self
            .data
            .range::<str, _>((lower, Bound::Unbounded))
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        KeyPage::from_keys(keys, limit)
    }
}

/// Staged writes for one transaction over a locked shard
struct StagedTransaction<'a> {
    base: &'a BTreeMap<String, Value>,
    /// `None` marks a delete
    writes: BTreeMap<String, Option<Value>>,
}

impl<'a> StagedTransaction<'a> {
    fn new(base: &'a BTreeMap<String, Value>) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    fn into_writes(self) -> BTreeMap<String, Option<Value>> {
        self.writes
    }
}

impl ShardTransaction for StagedTransaction<'_> {
    fn get(&mut self, key: &str) -> StorageResult<Option<Value>> {
        match self.writes.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => Ok(self.base.get(key).cloned()),
        }
    }

    fn put(&mut self, key: &str, value: Value) -> StorageResult<()> {
        self.writes.insert(key.to_string(), Some(value));
        Ok(())
    }

    fn delete(&mut self, key: &str) -> StorageResult<bool> {
        let existed = self.get(key)?.is_some();
        self.writes.insert(key.to_string(), None);
        Ok(existed)
    }
}

/// Sharded storage - DashMap by ShardId, BTreeMap within
///
/// # Thread Safety
///
/// All operations are thread-safe:
/// - Single-key operations lock only the target shard, briefly
/// - Transactions lock the target shard for the duration of the body
/// - Different shards never contend
///
/// # Example
///
/// ```ignore
/// use docket_storage::ShardedStore;
/// use std::sync::Arc;
///
/// let store = Arc::new(ShardedStore::new());
/// store.put(&ShardId::new("user:u1"), "user:u1", json!({"v": 1, "data": {}}))?;
/// ```
pub struct ShardedStore {
    shards: DashMap<ShardId, Arc<Mutex<Shard>>, FxBuildHasher>,
}

impl ShardedStore {
    /// Create new sharded store
    pub fn new() -> Self {
        Self {
            shards: DashMap::with_hasher(FxBuildHasher::default()),
        }
    }

    /// Create with expected number of shards
    pub fn with_capacity(num_shards: usize) -> Self {
        Self {
            shards: DashMap::with_capacity_and_hasher(num_shards, FxBuildHasher::default()),
        }
    }

    /// Get number of live shards
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Get total number of keys across all shards
    pub fn key_count(&self) -> usize {
        let mut total = 0;
        for entry in self.shards.iter() {
            total += entry.value().lock().len();
        }
        total
    }

    /// Get number of keys in one shard
    pub fn shard_len(&self, shard: &ShardId) -> usize {
        self.existing(shard).map_or(0, |handle| handle.lock().len())
    }

    /// Names of all live shards, sorted
    pub fn shard_ids(&self) -> Vec<ShardId> {
        let mut ids: Vec<ShardId> = self.shards.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Existing shard handle, if any. The DashMap guard is released on return.
    fn existing(&self, shard: &ShardId) -> Option<Arc<Mutex<Shard>>> {
        self.shards.get(shard).map(|entry| Arc::clone(entry.value()))
    }

    /// Shard handle, creating the shard if needed
    fn get_or_create(&self, shard: &ShardId) -> Arc<Mutex<Shard>> {
        if let Some(existing) = self.existing(shard) {
            return existing;
        }
        Arc::clone(self.shards.entry(shard.clone()).or_default().value())
    }

    /// Drop the shard if it is empty and nobody else holds it.
    ///
    /// Handles are only cloned under the DashMap lock, which `remove_if`
    /// holds, so a strong count of one means no concurrent user.
    fn prune(&self, shard: &ShardId) {
        self.shards
            .remove_if(shard, |_, s| Arc::strong_count(s) == 1 && s.lock().is_empty());
    }

    pub(crate) fn insert_shard(&self, shard: ShardId, data: Shard) {
        self.shards.insert(shard, Arc::new(Mutex::new(data)));
    }

    pub(crate) fn export_shards(&self) -> BTreeMap<ShardId, Shard> {
        let mut out = BTreeMap::new();
        for entry in self.shards.iter() {
            let copy = entry.value().lock().clone();
            if !copy.is_empty() {
                out.insert(entry.key().clone(), copy);
            }
        }
        out
    }
}

impl Default for ShardedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for ShardedStore {
    fn get(&self, shard: &ShardId, key: &str) -> StorageResult<Option<Value>> {
        let Some(handle) = self.existing(shard) else {
            return Ok(None);
        };
        let value = handle.lock().data.get(key).cloned();
        Ok(value)
    }

    fn put(&self, shard: &ShardId, key: &str, value: Value) -> StorageResult<()> {
        let handle = self.get_or_create(shard);
        handle.lock().data.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, shard: &ShardId, key: &str) -> StorageResult<bool> {
        let Some(handle) = self.existing(shard) else {
            return Ok(false);
        };
        let existed = handle.lock().data.remove(key).is_some();
        drop(handle);
        if existed {
            self.prune(shard);
        }
        Ok(existed)
    }

    fn has(&self, shard: &ShardId, key: &str) -> StorageResult<bool> {
        let Some(handle) = self.existing(shard) else {
            return Ok(false);
        };
        let found = handle.lock().data.contains_key(key);
        Ok(found)
    }

    fn list(
        &self,
        shard: &ShardId,
        prefix: &str,
        start_after: Option<&str>,
        limit: Option<usize>,
    ) -> StorageResult<KeyPage> {
        let Some(handle) = self.existing(shard) else {
            return Ok(KeyPage::default());
        };
        let page = handle.lock().scan(prefix, start_after, limit);
        Ok(page)
    }

    fn delete_all(&self, shard: &ShardId) -> StorageResult<()> {
        if let Some(handle) = self.existing(shard) {
            let dropped = {
                let mut guard = handle.lock();
                let n = guard.len();
                guard.data.clear();
                n
            };
            tracing::debug!(target: "docket::storage", shard = %shard, dropped, "Shard cleared");
        }
        self.prune(shard);
        Ok(())
    }

    fn run_transaction(
        &self,
        shard: &ShardId,
        body: &mut dyn FnMut(&mut dyn ShardTransaction) -> Result<()>,
    ) -> Result<()> {
        let handle = self.get_or_create(shard);
        let outcome = {
            let mut guard = handle.lock();
            let mut txn = StagedTransaction::new(&guard.data);
            match body(&mut txn) {
                Ok(()) => {
                    let writes = txn.into_writes();
                    for (key, staged) in writes {
                        match staged {
                            Some(value) => {
                                guard.data.insert(key, value);
                            }
                            None => {
                                guard.data.remove(&key);
                            }
                        }
                    }
                    Ok(())
                }
                Err(e) => {
                    tracing::trace!(
                        target: "docket::storage",
                        shard = %shard,
                        error = %e,
                        "Transaction body failed, writes discarded"
                    );
                    Err(e)
                }
            }
        };
        drop(handle);
        self.prune(shard);
        outcome
    }
}
