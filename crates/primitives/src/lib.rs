//! Primitives layer for docket
//!
//! Provides the document-store building blocks as facades over a
//! `KeyValueStore`:
//! - **DocumentStore**: versioned documents written only by compare-and-swap
//! - **Entity**: typed handle over one document with bounded CAS retry
//! - **Index**: persisted set of ids with cursor pagination
//! - **Collection**: entities plus the index that enumerates them
//!
//! ## Design Principle: Stateless Facades
//!
//! `DocumentStore`, `Index` and `Collection` hold only an `Arc` to the engine
//! and their configuration. Multiple instances over the same engine are safe.
//! `Entity` is the exception: it caches the last state and version it saw,
//! but every write re-reads storage before its compare-and-swap.
//!
//! ## Atomicity
//!
//! A single document write is atomic, and so is one index batch. Operations
//! that touch a document and the index (`create`, `delete`, `delete_many`)
//! are not atomic across the two.
//!
//! ```rust,ignore
//! use docket_primitives::*;
//!
//! let users = Collection::new(store, CollectionConfig::new("user", "users", User::default()));
//! users.create(User::named("u1", "Ada"))?;
//! users.entity("u1").mutate(|u| u.renamed("Ada L."))?;
//! let page = users.list(None, Some(20))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod document;
pub mod entity;
pub mod index;
pub mod retry;

pub use collection::{Collection, CollectionConfig, Identified, KeyFn};
pub use document::DocumentStore;
pub use entity::{merge_fields, Entity, EntityState, Normalizer};
pub use index::Index;
pub use retry::{RetryConfig, DEFAULT_MAX_ATTEMPTS};
