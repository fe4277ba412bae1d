//! docket - versioned document store with optimistic concurrency
//!
//! docket stores typed documents on top of an ordered key-value engine. Every
//! document carries a version; writes are compare-and-swap with a bounded
//! retry loop. Collections pair entity documents with a persisted id index
//! that supports cursor pagination.
//!
//! # Quick Start
//!
//! ```ignore
//! use docket::{Collection, ShardedStore};
//! use docket::api::{user_collection, User, UserEvents};
//! use std::sync::Arc;
//!
//! let users = Collection::new(Arc::new(ShardedStore::new()), user_collection());
//! users.create(User::new("u1", "Ada"))?;
//!
//! let mut ada = users.entity("u1");
//! ada.mutate(|u| User { name: "Ada L.".into(), ..u.clone() })?;
//!
//! let page = users.list(None, Some(20))?;
//! ```
//!
//! # Architecture
//!
//! - `docket_core`: key layout, error taxonomy, the `KeyValueStore` contract
//!   (its main items are re-exported at the crate root)
//! - [`storage`]: `ShardedStore`, the in-memory engine with snapshots
//! - [`primitives`]: `DocumentStore`, `Entity`, `Index`, `Collection`
//! - [`api`]: HTTP request layer and server

pub use docket_api as api;
pub use docket_primitives as primitives;
pub use docket_storage as storage;

pub use docket_core::{
    document_key, index_root_key, Document, Error, KeyPage, KeyValueStore, Page, Result, ShardId,
    StorageError, TransactionExt,
};
pub use docket_primitives::{
    Collection, CollectionConfig, DocumentStore, Entity, Identified, Index, RetryConfig,
};
pub use docket_storage::ShardedStore;
