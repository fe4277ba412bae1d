//! Snapshot Persistence Tests
//!
//! A saved snapshot restores documents, versions and index markers exactly.

use crate::common::*;
use tempfile::TempDir;

#[test]
fn collection_survives_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docket.snapshot.json");

    let before = TestStore::new();
    let counters = before.counters();
    counters.create(Counter::new("a", 1)).unwrap();
    counters.create(Counter::new("b", 2)).unwrap();
    counters.entity("b").mutate(|c| c.bumped("t")).unwrap();
    before.store.save_to_file(&path).unwrap();

    let after = TestStore {
        store: std::sync::Arc::new(ShardedStore::load_from_file(&path).unwrap()),
    };
    let counters = after.counters();
    let page = counters.list(None, None).unwrap();
    let values: Vec<u64> = page.items.iter().map(|c| c.counter).collect();
    assert_eq!(values, vec![1, 3]);

    let mut b = counters.entity("b");
    b.state().unwrap();
    assert_eq!(b.version(), 2);
}

#[test]
fn snapshot_is_a_point_in_time_copy() {
    let store = TestStore::new();
    let counters = store.counters();
    counters.create(Counter::new("a", 1)).unwrap();

    let snapshot = store.store.snapshot();
    counters.create(Counter::new("b", 1)).unwrap();

    let restored = ShardedStore::from_snapshot(snapshot).unwrap();
    assert_eq!(restored.key_count(), 2); // one document, one marker
    assert!(store.store.key_count() > restored.key_count());
}

#[test]
fn empty_store_roundtrips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.json");
    ShardedStore::new().save_to_file(&path).unwrap();
    let restored = ShardedStore::load_from_file(&path).unwrap();
    assert_eq!(restored.shard_count(), 0);
}
