//! DocumentStore: versioned documents with compare-and-swap writes
//!
//! ## Design
//!
//! DocumentStore is a stateless facade over a `KeyValueStore`. It holds no
//! in-memory state beyond an `Arc` to the engine. Every document lives in
//! the shard named after its own key, so CAS on one document never contends
//! with any other.
//!
//! ## Write Path
//!
//! `cas_put` is the only way a document is written. Inside one shard
//! transaction it reads the stored version (absent = 0), rejects the write
//! if it differs from the expected version, and otherwise stores
//! `{v: expected + 1, data}`. There is no blind overwrite.

use docket_core::{
    CasOutcome, Document, KeyValueStore, Result, ShardId, TransactionExt, ABSENT_VERSION,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Versioned document storage
#[derive(Clone)]
pub struct DocumentStore {
    kv: Arc<dyn KeyValueStore>,
}

impl DocumentStore {
    /// Create new DocumentStore instance
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Get the underlying engine reference
    pub fn engine(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }

    /// Read the document stored under `key`
    ///
    /// Returns `None` if the key holds no document.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Document<T>>> {
        match self.kv.get(&ShardId::for_document(key), key)? {
            Some(raw) => Ok(Some(serde_json::from_value(raw)?)),
            None => Ok(None),
        }
    }

    /// Current version of the document, 0 if absent
    pub fn version(&self, key: &str) -> Result<u64> {
        Ok(self
            .get::<Value>(key)?
            .map(|doc| doc.version)
            .unwrap_or(ABSENT_VERSION))
    }

    /// Compare-and-swap: write only if the stored version matches
    ///
    /// Returns `CasOutcome { ok: true, version: expected + 1 }` on success,
    /// `CasOutcome { ok: false, version: current }` on mismatch. A rejected
    /// write leaves the document untouched.
    pub fn cas_put<T: Serialize>(
        &self,
        key: &str,
        expected_version: u64,
        payload: &T,
    ) -> Result<CasOutcome> {
        let data = serde_json::to_value(payload)?;
        self.kv.transaction(&ShardId::for_document(key), |txn| {
            let current = match txn.get(key)? {
                Some(raw) => serde_json::from_value::<Document<Value>>(raw)?.version,
                None => ABSENT_VERSION,
            };

            if current != expected_version {
                return Ok(CasOutcome::rejected(current));
            }

            let next = Document::new(expected_version + 1, data.clone());
            txn.put(key, serde_json::to_value(&next)?)?;
            Ok(CasOutcome::applied(next.version))
        })
    }

    /// Remove the document
    ///
    /// Returns true if it existed. A later write starts again at version 0.
    pub fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.kv.delete(&ShardId::for_document(key), key)?)
    }

    /// Check if the document exists
    pub fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.kv.has(&ShardId::for_document(key), key)?)
    }
}
