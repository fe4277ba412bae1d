//! Core types and traits for docket
//!
//! This crate defines the foundational types used throughout the system:
//! - ShardId: Unit of transactional isolation
//! - Key layout helpers: document keys, index root keys, marker keys
//! - Document: Versioned `{v, data}` wrapper and CAS outcome
//! - KeyPage / Page: Cursor-paginated listing results
//! - Error: Error type hierarchy
//! - Traits: KeyValueStore and ShardTransaction

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod traits;
pub mod types;

pub use document::{CasOutcome, Document, ABSENT_VERSION};
pub use error::{Error, Result, StorageError, StorageResult};
pub use traits::{KeyValueStore, ShardTransaction, TransactionExt};
pub use types::{
    document_key, index_root_key, marker_id, marker_key, KeyPage, Page, ShardId,
    INDEX_ROOT_ENTITY, MARKER_PREFIX,
};
