//! Entity Lifecycle Tests
//!
//! UNLOADED -> LOADED -> LOADED(vN) -> back to initial after delete,
//! with the handle reusable at every step.

use crate::common::*;
use serde_json::{json, Map};

#[test]
fn full_lifecycle_on_one_handle() {
    let store = TestStore::new();
    let counters = store.counters();
    let mut c = counters.entity("c1");

    assert!(!c.is_loaded());
    assert_eq!(c.ensure_state().unwrap(), Counter::new("c1", 0));
    assert_eq!(c.version(), 0);

    for n in 1..=3 {
        let out = c.mutate(|s| s.bumped("me")).unwrap();
        assert_eq!(out.counter, n);
        assert_eq!(c.version(), n);
    }

    assert!(c.delete().unwrap());
    assert_eq!(c.version(), 0);
    assert_eq!(c.cached().unwrap().counter, 0);

    c.save(Counter::new("c1", 42)).unwrap();
    assert_eq!(c.version(), 1);
    assert_eq!(counters.get("c1").unwrap().unwrap().counter, 42);
}

#[test]
fn delete_of_missing_entity_is_idempotent() {
    let store = TestStore::new();
    let mut c = store.counters().entity("ghost");
    for _ in 0..3 {
        assert!(!c.delete().unwrap());
    }
    assert!(!c.exists().unwrap());
}

#[test]
fn id_backfill_is_in_memory_only() {
    let store = TestStore::new();
    let docs = store.docs();
    docs.cas_put("counter:legacy", 0, &json!({"id": "", "counter": 7}))
        .unwrap();

    let counters = store.counters();
    let loaded = counters.get("legacy").unwrap().unwrap();
    assert_eq!(loaded.id, "legacy");
    assert_eq!(loaded.counter, 7);

    let stored = docs.get::<Counter>("counter:legacy").unwrap().unwrap();
    assert_eq!(stored.payload.id, "");

    // The next write persists the backfilled id
    counters.entity("legacy").mutate(|c| c.bumped("fix")).unwrap();
    let stored = docs.get::<Counter>("counter:legacy").unwrap().unwrap();
    assert_eq!(stored.payload.id, "legacy");
    assert_eq!(stored.version, 2);
}

#[test]
fn patch_is_a_shallow_merge() {
    let store = TestStore::new();
    let users = store.users();
    users.create(User::new("u1", "Ada")).unwrap();

    let mut partial = Map::new();
    partial.insert("name".into(), json!("Ada Lovelace"));
    partial.insert("preferences".into(), json!({"theme": "light", "notificationsEnabled": false}));
    let out = users.entity("u1").patch(partial).unwrap();

    assert_eq!(out.name, "Ada Lovelace");
    assert_eq!(out.preferences.theme, "light");
    assert!(out.events.is_empty());
}

#[test]
fn exists_ignores_the_cache() {
    let store = TestStore::new();
    let counters = store.counters();
    let mut a = counters.entity("c1");
    a.save(Counter::new("c1", 1)).unwrap();

    let mut b = counters.entity("c1");
    b.delete().unwrap();

    assert!(a.cached().is_some());
    assert!(!a.exists().unwrap());
}
