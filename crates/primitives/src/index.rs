//! Index: a persisted set of ids
//!
//! Membership is stored as one marker key `i:<id>` per member inside the
//! shard named after the index root key. The marker value carries no
//! meaning. Batched adds and removes run in a single shard transaction, so
//! each batch is applied as a group.

use docket_core::{
    index_root_key, marker_id, marker_key, KeyValueStore, Page, Result, ShardId, TransactionExt,
    MARKER_PREFIX,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn marker_value() -> Value {
    json!(1)
}

/// Ordered set of ids backed by marker keys
#[derive(Clone)]
pub struct Index {
    kv: Arc<dyn KeyValueStore>,
    name: String,
    shard: ShardId,
}

impl Index {
    /// Handle for the index called `name`
    pub fn new(kv: Arc<dyn KeyValueStore>, name: impl Into<String>) -> Self {
        let name = name.into();
        let shard = ShardId::for_index(&name);
        Self { kv, name, shard }
    }

    /// Index name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root key, `sys-index-root:index:<name>`
    pub fn root_key(&self) -> String {
        index_root_key(&self.name)
    }

    /// Shard holding the markers
    pub fn shard(&self) -> &ShardId {
        &self.shard
    }

    /// Add every id in one transaction. Re-adding a member is a no-op.
    pub fn add_batch<I>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let keys: Vec<String> = ids.into_iter().map(|id| marker_key(id.as_ref())).collect();
        if keys.is_empty() {
            return Ok(());
        }
        self.kv.transaction(&self.shard, |txn| {
            for key in &keys {
                txn.put(key, marker_value())?;
            }
            Ok(())
        })?;
        tracing::trace!(target: "docket::index", index = %self.name, count = keys.len(), "Markers added");
        Ok(())
    }

    /// Add one id
    pub fn add(&self, id: &str) -> Result<()> {
        self.add_batch([id])
    }

    /// Remove every id in one transaction.
    ///
    /// Returns how many were members. Absent ids are skipped.
    pub fn remove_batch<I>(&self, ids: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let keys: Vec<String> = ids.into_iter().map(|id| marker_key(id.as_ref())).collect();
        if keys.is_empty() {
            return Ok(0);
        }
        let removed = self.kv.transaction(&self.shard, |txn| {
            let mut removed = 0;
            for key in &keys {
                if txn.delete(key)? {
                    removed += 1;
                }
            }
            Ok(removed)
        })?;
        tracing::trace!(target: "docket::index", index = %self.name, removed, "Markers removed");
        Ok(removed)
    }

    /// Remove one id; true if it was a member
    pub fn remove(&self, id: &str) -> Result<bool> {
        Ok(self.remove_batch([id])? > 0)
    }

    /// Drop every member of this index
    pub fn clear(&self) -> Result<()> {
        self.kv.delete_all(&self.shard)?;
        tracing::debug!(target: "docket::index", index = %self.name, "Index cleared");
        Ok(())
    }

    /// True if `id` is a member
    pub fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.kv.has(&self.shard, &marker_key(id))?)
    }

    /// One page of member ids in lexicographic order.
    ///
    /// `cursor` is the raw `next` value of a previous page (a marker key).
    pub fn page(&self, cursor: Option<&str>, limit: Option<usize>) -> Result<Page<String>> {
        let listed = self.kv.list(&self.shard, MARKER_PREFIX, cursor, limit)?;
        let items = listed
            .keys
            .iter()
            .filter_map(|key| marker_id(key))
            .map(str::to_string)
            .collect();
        Ok(Page {
            items,
            next: listed.next,
        })
    }

    /// Every member id. Cost grows with the index size.
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.page(None, None)?.items)
    }

    /// True if the index has no members
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.page(None, Some(1))?.is_empty())
    }
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("name", &self.name)
            .field("shard", &self.shard)
            .finish()
    }
}
