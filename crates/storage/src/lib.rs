//! Storage layer for docket
//!
//! This crate implements the in-memory `KeyValueStore` backend:
//! - ShardedStore: DashMap of shards, each an ordered BTreeMap behind a mutex
//! - Per-shard transactions with staged, all-or-nothing writes
//! - Lexicographic prefix listing with `start_after` cursors
//! - StoreSnapshot: JSON snapshots for persistence across restarts
//!
//! # Sharding
//!
//! Different shards never contend. A document owns the shard named after its
//! key; an index owns the shard named after its root key, with its member
//! markers inside it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod sharded;
pub mod snapshot;

pub use sharded::{Shard, ShardedStore};
pub use snapshot::{StoreSnapshot, SNAPSHOT_FORMAT_VERSION};
