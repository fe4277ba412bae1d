//! Versioned document contract
//!
//! A document is `{version, payload}` stored under one key. Version 0 means
//! "absent"; every successful write bumps it by exactly one. Deleting a
//! document removes the key outright, so a later write starts over at 0.
//!
//! The persisted field names are `v` and `data`.

use serde::{Deserialize, Serialize};

/// Version reported for a key that holds no document
pub const ABSENT_VERSION: u64 = 0;

/// A payload together with its write counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document<T> {
    /// Number of successful writes since the key was (re)created
    #[serde(rename = "v")]
    pub version: u64,
    /// Stored state
    #[serde(rename = "data")]
    pub payload: T,
}

impl<T> Document<T> {
    /// Create a document at an explicit version
    pub fn new(version: u64, payload: T) -> Self {
        Self { version, payload }
    }

    /// Transform the payload, keeping the version
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Document<U> {
        Document {
            version: self.version,
            payload: f(self.payload),
        }
    }
}

/// Result of a compare-and-swap write
///
/// On success `version` is the newly written version. On failure it is the
/// version currently stored, which the caller can retry against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasOutcome {
    /// Whether the write was applied
    pub ok: bool,
    /// Resulting (or current) version
    pub version: u64,
}

impl CasOutcome {
    /// Write applied at `version`
    pub fn applied(version: u64) -> Self {
        Self { ok: true, version }
    }

    /// Write rejected, store is at `current`
    pub fn rejected(current: u64) -> Self {
        Self {
            ok: false,
            version: current,
        }
    }
}
