//! Document CAS Tests
//!
//! - Absent documents have version 0
//! - Each successful write increments the version by exactly 1
//! - A mismatched write never mutates the stored document
//! - Deletion resets the version counter

use crate::common::*;
use docket::api::User;
use serde_json::{json, Value};

#[test]
fn version_sequence_is_dense() {
    let store = TestStore::new();
    let docs = store.docs();
    let key = unique_id("doc");

    assert_eq!(docs.version(&key).unwrap(), 0);
    for expected in 0..10u64 {
        let outcome = docs.cas_put(&key, expected, &json!({"n": expected})).unwrap();
        assert!(outcome.ok);
        assert_eq!(outcome.version, expected + 1);
    }
    assert_eq!(docs.version(&key).unwrap(), 10);
}

#[test]
fn wrong_version_is_rejected_without_mutation() {
    let store = TestStore::new();
    let docs = store.docs();
    docs.cas_put("k", 0, &json!("kept")).unwrap();
    docs.cas_put("k", 1, &json!("kept too")).unwrap();

    for wrong in [0u64, 1, 3, 100] {
        let outcome = docs.cas_put("k", wrong, &json!("lost")).unwrap();
        assert!(!outcome.ok);
        assert_eq!(outcome.version, 2);
    }
    let doc = docs.get::<Value>("k").unwrap().unwrap();
    assert_eq!(doc.version, 2);
    assert_eq!(doc.payload, json!("kept too"));
}

#[test]
fn deletion_is_indistinguishable_from_absence() {
    let store = TestStore::new();
    let docs = store.docs();
    docs.cas_put("k", 0, &1).unwrap();
    docs.cas_put("k", 1, &2).unwrap();
    docs.delete("k").unwrap();

    assert!(docs.get::<Value>("k").unwrap().is_none());
    assert!(!docs.cas_put("k", 2, &3).unwrap().ok);
    assert!(docs.cas_put("k", 0, &3).unwrap().ok);
    assert_eq!(docs.version("k").unwrap(), 1);
}

#[test]
fn documents_live_in_their_own_shard() {
    let store = TestStore::new();
    let docs = store.docs();
    docs.cas_put("user:u1", 0, &User::new("u1", "Ada")).unwrap();
    docs.cas_put("user:u2", 0, &User::new("u2", "Bob")).unwrap();

    assert_eq!(store.store.shard_count(), 2);
    assert_eq!(store.store.shard_len(&ShardId::new("user:u1")), 1);

    let raw = store
        .store
        .get(&ShardId::new("user:u1"), "user:u1")
        .unwrap()
        .unwrap();
    assert_eq!(raw["v"], 1);
    assert_eq!(raw["data"]["name"], "Ada");
}

#[test]
fn typed_read_of_incompatible_payload_is_serialization_error() {
    let store = TestStore::new();
    let docs = store.docs();
    docs.cas_put("k", 0, &json!({"unexpected": true})).unwrap();
    let err = docs.get::<User>("k").unwrap_err();
    assert!(matches!(err, docket::Error::Serialization(_)));
}
