//! Core traits for storage abstraction
//!
//! This module defines the `KeyValueStore` contract that the document layer
//! is written against. Any ordered key-value engine that can serialize
//! transactions per shard satisfies it; `docket-storage` ships an in-memory
//! implementation.
//!
//! ## Pagination Contract
//!
//! `list` returns keys in lexicographic order. A page holding exactly `limit`
//! keys reports its last key as `next`; the caller passes it back as
//! `start_after` to resume strictly after it. A shorter page, or a call with
//! no limit, reports `next = None`.

use serde_json::Value;

use crate::error::{Error, Result, StorageError, StorageResult};
use crate::types::{KeyPage, ShardId};

/// Operations available inside a shard transaction
///
/// Reads observe writes made earlier in the same transaction.
pub trait ShardTransaction {
    /// Read a value
    fn get(&mut self, key: &str) -> StorageResult<Option<Value>>;

    /// Write a value
    fn put(&mut self, key: &str, value: Value) -> StorageResult<()>;

    /// Remove a key, returning whether it was present
    fn delete(&mut self, key: &str) -> StorageResult<bool>;

    /// Existence check
    fn has(&mut self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Ordered key-value storage partitioned into shards
///
/// Thread safety: All methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`
    fn get(&self, shard: &ShardId, key: &str) -> StorageResult<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value
    fn put(&self, shard: &ShardId, key: &str, value: Value) -> StorageResult<()>;

    /// Remove `key`, returning whether it existed
    fn delete(&self, shard: &ShardId, key: &str) -> StorageResult<bool>;

    /// True if `key` is present
    fn has(&self, shard: &ShardId, key: &str) -> StorageResult<bool>;

    /// List keys starting with `prefix`
    ///
    /// # Arguments
    /// * `start_after` - resume strictly after this key
    /// * `limit` - maximum keys to return (None = all)
    fn list(
        &self,
        shard: &ShardId,
        prefix: &str,
        start_after: Option<&str>,
        limit: Option<usize>,
    ) -> StorageResult<KeyPage>;

    /// Drop every key in the shard
    fn delete_all(&self, shard: &ShardId) -> StorageResult<()>;

    /// Run `body` atomically against one shard
    ///
    /// Writes become visible only if `body` returns `Ok`. An error from
    /// `body` discards them and is returned unchanged. Implementations may
    /// invoke `body` more than once if they retry internally.
    fn run_transaction(
        &self,
        shard: &ShardId,
        body: &mut dyn FnMut(&mut dyn ShardTransaction) -> Result<()>,
    ) -> Result<()>;
}

/// Typed convenience over `KeyValueStore::run_transaction`
pub trait TransactionExt {
    /// Run `f` in a shard transaction and return its result
    fn transaction<T, F>(&self, shard: &ShardId, f: F) -> Result<T>
    where
        F: FnMut(&mut dyn ShardTransaction) -> Result<T>;
}

impl<S: KeyValueStore + ?Sized> TransactionExt for S {
    fn transaction<T, F>(&self, shard: &ShardId, mut f: F) -> Result<T>
    where
        F: FnMut(&mut dyn ShardTransaction) -> Result<T>,
    {
        let mut out = None;
        self.run_transaction(shard, &mut |txn| {
            out = Some(f(txn)?);
            Ok(())
        })?;
        out.ok_or_else(|| {
            Error::Storage(StorageError::Backend(format!(
                "transaction on shard '{}' committed without running its body",
                shard
            )))
        })
    }
}
