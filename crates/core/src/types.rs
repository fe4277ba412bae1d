//! Key layout and paging types
//!
//! The persisted layout is fixed:
//!
//! - document keys: `<entityName>:<id>`
//! - index root keys: `sys-index-root:index:<indexName>`
//! - index member markers: `i:<id>`, stored inside the index's own shard
//!
//! A shard is the unit of transactional isolation. Every document lives in a
//! shard named after its own key, and every index owns the shard named after
//! its root key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity name used for index root documents
pub const INDEX_ROOT_ENTITY: &str = "sys-index-root";

/// Prefix for index member marker keys
pub const MARKER_PREFIX: &str = "i:";

/// Name of one logical storage shard
///
/// Transactions are serialized per shard. There is no cross-shard atomicity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShardId(String);

impl ShardId {
    /// Wrap a raw shard name
    pub fn new(name: impl Into<String>) -> Self {
        ShardId(name.into())
    }

    /// Shard owning the document with the given key
    pub fn for_document(key: &str) -> Self {
        ShardId(key.to_string())
    }

    /// Shard owning the named index
    pub fn for_index(index_name: &str) -> Self {
        ShardId(index_root_key(index_name))
    }

    /// Raw shard name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShardId {
    fn from(s: &str) -> Self {
        ShardId::new(s)
    }
}

/// Storage key of an entity document
pub fn document_key(entity_name: &str, id: &str) -> String {
    format!("{}:{}", entity_name, id)
}

/// Storage key of an index's root document
pub fn index_root_key(index_name: &str) -> String {
    document_key(INDEX_ROOT_ENTITY, &format!("index:{}", index_name))
}

/// Marker key recording membership of `id` in an index
pub fn marker_key(id: &str) -> String {
    format!("{}{}", MARKER_PREFIX, id)
}

/// Recover the member id from a marker key
///
/// Returns `None` for keys outside the marker keyspace.
pub fn marker_id(key: &str) -> Option<&str> {
    key.strip_prefix(MARKER_PREFIX)
}

/// One page of keys from a prefix listing
///
/// `next` is the last returned key when the page was full, `None` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPage {
    /// Keys in lexicographic order
    pub keys: Vec<String>,
    /// Cursor to resume after, if more keys may exist
    pub next: Option<String>,
}

impl KeyPage {
    /// Build a page, deriving `next` from the requested limit.
    ///
    /// A page holding exactly `limit` keys may have successors, so its last
    /// key becomes the cursor. Anything shorter (or an unbounded listing)
    /// ends the listing.
    pub fn from_keys(keys: Vec<String>, limit: Option<usize>) -> Self {
        let next = match limit {
            Some(n) if n > 0 && keys.len() == n => keys.last().cloned(),
            _ => None,
        };
        KeyPage { keys, next }
    }
}

/// One page of items with a resume cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in listing order
    pub items: Vec<T>,
    /// Cursor to pass to the next call, `None` at end of listing
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// Transform every item, keeping the cursor
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next: self.next,
        }
    }

    /// Number of items on this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the page holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
