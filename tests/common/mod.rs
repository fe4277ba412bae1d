//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from any suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub use docket::api::{chat_collection, user_collection, ChatBoard, User};
pub use docket::{
    Collection, CollectionConfig, DocumentStore, Entity, Identified, Index, KeyValueStore,
    RetryConfig, ShardId, ShardedStore,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// TestStore - engine plus typed views
// ============================================================================

/// In-memory engine with helpers for each layer.
pub struct TestStore {
    pub store: Arc<ShardedStore>,
}

impl TestStore {
    pub fn new() -> Self {
        TestStore {
            store: Arc::new(ShardedStore::new()),
        }
    }

    pub fn kv(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }

    pub fn docs(&self) -> DocumentStore {
        DocumentStore::new(self.kv())
    }

    pub fn index(&self, name: &str) -> Index {
        Index::new(self.kv(), name)
    }

    pub fn counters(&self) -> Collection<Counter> {
        Collection::new(self.kv(), counter_config())
    }

    pub fn counters_with_retry(&self, retry: RetryConfig) -> Collection<Counter> {
        Collection::new(self.kv(), counter_config().with_retry(retry))
    }

    pub fn users(&self) -> Collection<User> {
        Collection::new(self.kv(), user_collection())
    }

    pub fn chats(&self) -> Collection<ChatBoard> {
        Collection::new(self.kv(), chat_collection())
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Counter - minimal identified state
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    pub id: String,
    pub counter: u64,
    #[serde(default)]
    pub touched_by: Vec<String>,
}

impl Counter {
    pub fn new(id: &str, counter: u64) -> Self {
        Counter {
            id: id.to_string(),
            counter,
            touched_by: Vec::new(),
        }
    }

    pub fn bumped(&self, by: &str) -> Self {
        let mut next = self.clone();
        next.counter += 1;
        next.touched_by.push(by.to_string());
        next
    }
}

impl Identified for Counter {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

pub fn counter_config() -> CollectionConfig<Counter> {
    CollectionConfig::new("counter", "counters", Counter::default())
}

// ============================================================================
// Key Helpers
// ============================================================================

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique id for test isolation.
pub fn unique_id(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{:06}", prefix, n)
}
