//! Error types for docket
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! ## Taxonomy
//!
//! - `ConcurrencyConflict`: the bounded CAS retry loop ran out of attempts.
//!   This is the only failure the entity layer raises on its own.
//! - `NotFound` / `Validation`: produced by the request layer before or after
//!   calling into the store. The store itself treats absence as default state.
//! - `Storage`: anything the key-value engine reports. Carried through
//!   unchanged, never rewrapped.

use std::io;
use thiserror::Error;

/// Result type alias for docket operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for raw storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors reported by a `KeyValueStore` implementation
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error (snapshot files, remote engines)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Engine-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Snapshot could not be encoded or decoded
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

/// Error types for the document store
#[derive(Debug, Error)]
pub enum Error {
    /// Every CAS attempt observed a newer version than the one it read
    #[error("Concurrent modification detected on '{key}' after {attempts} attempts")]
    ConcurrencyConflict {
        /// Document key under contention
        key: String,
        /// Number of attempts made before giving up
        attempts: usize,
    },

    /// A required document or entity is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller input failed a precondition
    #[error("Validation error: {0}")]
    Validation(String),

    /// Payload could not be converted to or from its stored form
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Storage layer error, propagated as-is
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl Error {
    /// Shorthand for a `NotFound` error
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    /// Shorthand for a `Validation` error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// True if the error is a CAS retry exhaustion.
    ///
    /// Callers may retry the whole operation at a higher level.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::ConcurrencyConflict { .. })
    }

    /// True if the error reports a missing entity
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// True if the error reports invalid caller input
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
