//! Entity: a typed handle over one versioned document
//!
//! ## Lifecycle
//!
//! A handle starts unloaded. The first read caches the stored state and
//! version (or the configured initial state at version 0 when the document
//! is absent; nothing is written). Every successful write refreshes the
//! cache. `delete` resets the cache to the initial state at version 0, so
//! the same handle can recreate the entity.
//!
//! The cache is a convenience for the owning caller only. It is never
//! authoritative: writes always re-read the stored version first.
//!
//! ## Purity Requirement
//!
//! The updater passed to `mutate` may be called multiple times due to CAS
//! retries. It should be a pure function of the state it is given.

use crate::document::DocumentStore;
use crate::retry::RetryConfig;
use docket_core::{document_key, Error, Result, ABSENT_VERSION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Bounds every entity state type must satisfy
pub trait EntityState: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> EntityState for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Fix-up applied to every state read from storage, given the handle's id
pub type Normalizer<S> = fn(&mut S, &str);

/// Typed handle bound to the document `<entity_name>:<id>`
///
/// # Example
///
/// ```ignore
/// let mut counter = Entity::new(docs, "counter".into(), "c1", Arc::new(Counter::default()));
/// counter.mutate(|c| Counter { hits: c.hits + 1 })?;
/// assert_eq!(counter.version(), 1);
/// ```
pub struct Entity<S> {
    docs: DocumentStore,
    entity_name: Arc<str>,
    id: String,
    key: String,
    initial_state: Arc<S>,
    retry: RetryConfig,
    normalize: Option<Normalizer<S>>,
    version: u64,
    state: Option<S>,
}

impl<S: EntityState> Entity<S> {
    /// Create a handle. Nothing is read until the first operation.
    pub fn new(
        docs: DocumentStore,
        entity_name: Arc<str>,
        id: impl Into<String>,
        initial_state: Arc<S>,
    ) -> Self {
        let id = id.into();
        let key = document_key(&entity_name, &id);
        Self {
            docs,
            entity_name,
            id,
            key,
            initial_state,
            retry: RetryConfig::default(),
            normalize: None,
            version: ABSENT_VERSION,
            state: None,
        }
    }

    /// Use a custom retry policy for `save` / `mutate`
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Apply `normalize` to every state read from storage
    pub fn with_normalizer(mut self, normalize: Normalizer<S>) -> Self {
        self.normalize = Some(normalize);
        self
    }

    /// Entity id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Entity type name
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Storage key, `<entity_name>:<id>`
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Version observed by the last read or write (0 = absent)
    pub fn version(&self) -> u64 {
        self.version
    }

    /// True once a read or write has populated the cache
    pub fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    /// Cached state, if loaded
    pub fn cached(&self) -> Option<&S> {
        self.state.as_ref()
    }

    // ========== Reads ==========

    /// Read the stored document into the cache.
    ///
    /// Returns whether the document exists.
    fn refresh(&mut self) -> Result<bool> {
        let (version, mut state, present) = match self.docs.get::<S>(&self.key)? {
            Some(doc) => (doc.version, doc.payload, true),
            None => (ABSENT_VERSION, S::clone(&self.initial_state), false),
        };
        if let Some(normalize) = self.normalize {
            normalize(&mut state, &self.id);
        }
        self.version = version;
        self.state = Some(state);
        Ok(present)
    }

    fn cached_or_initial(&self) -> S {
        match &self.state {
            Some(state) => state.clone(),
            None => S::clone(&self.initial_state),
        }
    }

    /// Return the cached state, reading storage only if not yet loaded.
    ///
    /// An absent document yields the initial state at version 0.
    pub fn ensure_state(&mut self) -> Result<S> {
        if self.state.is_none() {
            self.refresh()?;
        }
        Ok(self.cached_or_initial())
    }

    /// Re-read storage and return the current state
    pub fn state(&mut self) -> Result<S> {
        self.refresh()?;
        Ok(self.cached_or_initial())
    }

    /// Re-read storage; `None` if the document is absent
    pub fn fetch(&mut self) -> Result<Option<S>> {
        if self.refresh()? {
            Ok(Some(self.cached_or_initial()))
        } else {
            Ok(None)
        }
    }

    /// True iff the document is present in storage. Ignores the cache.
    pub fn exists(&self) -> Result<bool> {
        self.docs.exists(&self.key)
    }

    // ========== Writes ==========

    /// Bounded CAS loop shared by `save` and `mutate`.
    ///
    /// Each attempt re-reads the stored version and state, computes the
    /// candidate from that fresh state, and tries to swap it in.
    fn commit_with_retry<F>(&mut self, mut next_from: F) -> Result<S>
    where
        F: FnMut(&S) -> Result<S>,
    {
        let attempts = self.retry.attempts();
        for attempt in 0..attempts {
            self.refresh()?;
            let current = self.cached_or_initial();
            let expected = self.version;
            let next = next_from(&current)?;

            let outcome = self.docs.cas_put(&self.key, expected, &next)?;
            if outcome.ok {
                self.version = outcome.version;
                self.state = Some(next.clone());
                return Ok(next);
            }

            tracing::debug!(
                target: "docket::entity",
                key = %self.key,
                attempt = attempt + 1,
                expected,
                current = outcome.version,
                "CAS conflict, retrying"
            );
            if attempt + 1 < attempts {
                let delay = self.retry.delay_for(attempt);
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
            }
        }

        tracing::warn!(
            target: "docket::entity",
            key = %self.key,
            attempts,
            "CAS retry budget exhausted"
        );
        Err(Error::ConcurrencyConflict {
            key: self.key.clone(),
            attempts,
        })
    }

    /// Replace the whole state.
    ///
    /// # Errors
    ///
    /// `ConcurrencyConflict` if every attempt lost the race.
    pub fn save(&mut self, next: S) -> Result<()> {
        self.commit_with_retry(|_| Ok(next.clone()))?;
        Ok(())
    }

    /// Read-modify-write with a fallible updater.
    ///
    /// Returns the state that was committed.
    pub fn try_mutate<F>(&mut self, updater: F) -> Result<S>
    where
        F: FnMut(&S) -> Result<S>,
    {
        self.commit_with_retry(updater)
    }

    /// Read-modify-write. The updater sees the freshly read state on every
    /// attempt, so no update is lost while the retry budget holds.
    ///
    /// Returns the state that was committed.
    pub fn mutate<F>(&mut self, mut updater: F) -> Result<S>
    where
        F: FnMut(&S) -> S,
    {
        self.commit_with_retry(|current| Ok(updater(current)))
    }

    /// Shallow merge of top-level fields into the state.
    ///
    /// Equivalent to `mutate(|s| {...s, ...partial})`.
    ///
    /// # Errors
    ///
    /// `Validation` if the state does not serialize to an object, or if the
    /// merged object no longer fits the state type.
    pub fn patch(&mut self, partial: Map<String, Value>) -> Result<S> {
        self.try_mutate(|current| merge_fields(current, &partial))
    }

    /// Remove the document.
    ///
    /// Returns whether it existed. On success the handle is reset to the
    /// initial state at version 0.
    pub fn delete(&mut self) -> Result<bool> {
        let existed = self.docs.delete(&self.key)?;
        if existed {
            self.version = ABSENT_VERSION;
            self.state = Some(S::clone(&self.initial_state));
        }
        Ok(existed)
    }
}

/// Overlay the top-level fields of `partial` onto `state`
pub fn merge_fields<S: EntityState>(state: &S, partial: &Map<String, Value>) -> Result<S> {
    let mut fields = match serde_json::to_value(state)? {
        Value::Object(fields) => fields,
        other => {
            return Err(Error::validation(format!(
                "patch requires an object state, found {}",
                json_kind(&other)
            )))
        }
    };
    for (name, value) in partial {
        fields.insert(name.clone(), value.clone());
    }
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| Error::validation(format!("patch does not fit the state: {}", e)))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
