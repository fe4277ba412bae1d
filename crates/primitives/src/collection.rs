//! Collection: entities kept together with an index of their ids
//!
//! A collection is configured with plain data (`CollectionConfig`) and
//! composes a `DocumentStore` for the entity documents with an `Index` for
//! membership.
//!
//! ## Consistency
//!
//! Document writes and index updates are separate operations. `create` may
//! leave a document without its index entry if it fails halfway, and
//! `delete` may leave an index entry without its document. Listings tolerate
//! both: an indexed id with no document is returned as the initial state.
//! `remove_from_index` hides an entity from listings on purpose while
//! keeping its document.

use crate::document::DocumentStore;
use crate::entity::{Entity, EntityState};
use crate::index::Index;
use crate::retry::RetryConfig;
use docket_core::{KeyValueStore, Page, Result};
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;

/// State types that carry their own id
pub trait Identified {
    /// Id stored in the state
    fn id(&self) -> &str;

    /// Overwrite the stored id
    fn set_id(&mut self, id: &str);
}

/// Derives the entity id from a state value
pub type KeyFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Fill in a missing id from the handle's id. Only the in-memory copy changes.
fn backfill_id<S: Identified>(state: &mut S, id: &str) {
    if state.id().is_empty() {
        state.set_id(id);
    }
}

/// Static configuration of one collection
pub struct CollectionConfig<S> {
    entity_name: Arc<str>,
    index_name: String,
    initial_state: Arc<S>,
    key_of: KeyFn<S>,
    seed_data: Vec<S>,
    retry: RetryConfig,
}

impl<S: EntityState + Identified> CollectionConfig<S> {
    /// Configuration keyed by the state's own id, with no seed data
    pub fn new(entity_name: &str, index_name: &str, initial_state: S) -> Self {
        Self {
            entity_name: Arc::from(entity_name),
            index_name: index_name.to_string(),
            initial_state: Arc::new(initial_state),
            key_of: Arc::new(|state: &S| state.id().to_string()),
            seed_data: Vec::new(),
            retry: RetryConfig::default(),
        }
    }

    /// Derive ids with a custom extractor
    pub fn with_key_of<F>(mut self, key_of: F) -> Self
    where
        F: Fn(&S) -> String + Send + Sync + 'static,
    {
        self.key_of = Arc::new(key_of);
        self
    }

    /// States written by `ensure_seed` when the index is empty
    pub fn with_seed(mut self, seed_data: Vec<S>) -> Self {
        self.seed_data = seed_data;
        self
    }

    /// Retry policy for every entity handle of this collection
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Entity type name (document key prefix)
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Index name
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// State used for absent documents
    pub fn initial_state(&self) -> &S {
        &self.initial_state
    }

    /// Seed states
    pub fn seed_data(&self) -> &[S] {
        &self.seed_data
    }

    /// Retry policy
    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Id of `state` according to the configured extractor
    pub fn key_of(&self, state: &S) -> String {
        (self.key_of)(state)
    }
}

impl<S> fmt::Debug for CollectionConfig<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionConfig")
            .field("entity_name", &self.entity_name)
            .field("index_name", &self.index_name)
            .field("seed_len", &self.seed_data.len())
            .field("retry", &self.retry)
            .finish()
    }
}

/// A set of entities of one type plus the index that enumerates them
pub struct Collection<S> {
    docs: DocumentStore,
    index: Index,
    config: Arc<CollectionConfig<S>>,
}

impl<S> Clone for Collection<S> {
    fn clone(&self) -> Self {
        Self {
            docs: self.docs.clone(),
            index: self.index.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: EntityState + Identified> Collection<S> {
    /// Bind a configuration to a store
    pub fn new(kv: Arc<dyn KeyValueStore>, config: CollectionConfig<S>) -> Self {
        let index = Index::new(Arc::clone(&kv), config.index_name.clone());
        Self {
            docs: DocumentStore::new(kv),
            index,
            config: Arc::new(config),
        }
    }

    /// Configuration
    pub fn config(&self) -> &CollectionConfig<S> {
        &self.config
    }

    /// Membership index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Entity handle for `id`; states read without an id get `id` filled in
    pub fn entity(&self, id: &str) -> Entity<S> {
        Entity::new(
            self.docs.clone(),
            Arc::clone(&self.config.entity_name),
            id,
            Arc::clone(&self.config.initial_state),
        )
        .with_retry(self.config.retry.clone())
        .with_normalizer(backfill_id::<S>)
    }

    /// Write `state` under its derived id and add the id to the index.
    ///
    /// Overwrites any existing document with the same id.
    pub fn create(&self, state: S) -> Result<S> {
        let id = self.config.key_of(&state);
        self.entity(&id).save(state.clone())?;
        self.index.add(&id)?;
        tracing::debug!(
            target: "docket::collection",
            entity = %self.config.entity_name,
            id = %id,
            "Entity created"
        );
        Ok(state)
    }

    /// Current state of `id`, `None` if its document is absent
    pub fn get(&self, id: &str) -> Result<Option<S>> {
        self.entity(id).fetch()
    }

    /// One page of entities in id order.
    ///
    /// Documents are fetched in parallel. `items` lines up 1:1 with the
    /// page of ids; an id whose document is missing yields the initial state.
    pub fn list(&self, cursor: Option<&str>, limit: Option<usize>) -> Result<Page<S>> {
        let ids = self.index.page(cursor, limit)?;
        let items = ids
            .items
            .par_iter()
            .map(|id| self.entity(id).state())
            .collect::<Result<Vec<S>>>()?;
        Ok(Page {
            items,
            next: ids.next,
        })
    }

    /// Write the seed data if the index is empty.
    ///
    /// Returns whether seeding ran. A non-empty index always skips, even if
    /// an earlier seeding stopped partway.
    pub fn ensure_seed(&self) -> Result<bool> {
        let seeds = &self.config.seed_data;
        if seeds.is_empty() || !self.index.is_empty()? {
            return Ok(false);
        }
        let ids = seeds
            .par_iter()
            .map(|seed| -> Result<String> {
                let id = self.config.key_of(seed);
                self.entity(&id).save(seed.clone())?;
                Ok(id)
            })
            .collect::<Result<Vec<String>>>()?;
        self.index.add_batch(&ids)?;
        tracing::info!(
            target: "docket::collection",
            index = %self.config.index_name,
            count = ids.len(),
            "Seed data written"
        );
        Ok(true)
    }

    /// Delete the document of `id` and drop `id` from the index.
    ///
    /// Returns whether the document existed. The index entry is removed
    /// either way.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let existed = self.entity(id).delete()?;
        self.index.remove(id)?;
        Ok(existed)
    }

    /// Delete many documents in parallel, then drop all ids from the index
    /// in one batch.
    ///
    /// Returns how many documents existed.
    pub fn delete_many<I>(&self, ids: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let ids: Vec<String> = ids.into_iter().map(|id| id.as_ref().to_string()).collect();
        if ids.is_empty() {
            return Ok(0);
        }
        let existed = ids
            .par_iter()
            .map(|id| self.entity(id).delete())
            .collect::<Result<Vec<bool>>>()?;
        self.index.remove_batch(&ids)?;

        let removed = existed.into_iter().filter(|&e| e).count();
        tracing::debug!(
            target: "docket::collection",
            entity = %self.config.entity_name,
            requested = ids.len(),
            removed,
            "Entities deleted"
        );
        Ok(removed)
    }

    /// Drop `id` from the index only. The document stays readable by id.
    pub fn remove_from_index(&self, id: &str) -> Result<bool> {
        self.index.remove(id)
    }
}
