//! CAS Contention Tests
//!
//! - Two concurrent increments from 0 end at counter 2, version 2
//! - Up to `max_attempts` concurrent writers never lose an update
//! - Exhausting the budget reports `ConcurrencyConflict` and writes nothing

use crate::common::*;
use docket::Error;
use std::sync::{Arc, Barrier};
use std::thread;

fn run_writers(counters: &Collection<Counter>, id: &str, writers: usize) -> Vec<docket::Result<Counter>> {
    let barrier = Arc::new(Barrier::new(writers));
    let handles: Vec<_> = (0..writers)
        .map(|w| {
            let counters = counters.clone();
            let barrier = barrier.clone();
            let id = id.to_string();
            thread::spawn(move || {
                let mut handle = counters.entity(&id);
                let me = format!("w{}", w);
                barrier.wait();
                handle.mutate(|c| c.bumped(&me))
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn two_concurrent_increments() {
    for _ in 0..50 {
        let store = TestStore::new();
        let counters = store.counters();
        let id = unique_id("pair");

        for result in run_writers(&counters, &id, 2) {
            result.unwrap();
        }

        let mut c = counters.entity(&id);
        let state = c.state().unwrap();
        assert_eq!(state.counter, 2);
        assert_eq!(c.version(), 2);
    }
}

#[test]
fn writers_within_budget_never_lose_updates() {
    let writers = RetryConfig::default().attempts();
    for _ in 0..20 {
        let store = TestStore::new();
        let counters = store.counters();
        let id = unique_id("budget");

        let results = run_writers(&counters, &id, writers);
        assert!(results.iter().all(|r| r.is_ok()));

        let mut c = counters.entity(&id);
        let state = c.state().unwrap();
        assert_eq!(state.counter, writers as u64);
        assert_eq!(c.version(), writers as u64);

        let mut touched = state.touched_by.clone();
        touched.sort();
        touched.dedup();
        assert_eq!(touched.len(), writers);
    }
}

#[test]
fn larger_budget_absorbs_more_writers() {
    let writers = 16;
    let store = TestStore::new();
    let counters = store.counters_with_retry(RetryConfig::new().with_max_attempts(writers));
    let id = unique_id("wide");

    let results = run_writers(&counters, &id, writers);
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(counters.get(&id).unwrap().unwrap().counter, writers as u64);
}

#[test]
fn successes_and_version_always_agree() {
    // Far more writers than attempts: some may fail, but every success is
    // exactly one version step and every failure is a reported conflict.
    let writers = 24;
    let store = TestStore::new();
    let counters = store.counters_with_retry(RetryConfig::no_retry());
    let id = unique_id("crowd");

    let results = run_writers(&counters, &id, writers);
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    for failure in results.iter().filter_map(|r| r.as_ref().err()) {
        match failure {
            Error::ConcurrencyConflict { key, attempts } => {
                assert_eq!(key, &format!("counter:{}", id));
                assert_eq!(*attempts, 1);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    let mut c = counters.entity(&id);
    let state = c.state().unwrap();
    assert!(succeeded >= 1);
    assert_eq!(state.counter, succeeded as u64);
    assert_eq!(c.version(), succeeded as u64);
}

#[test]
fn backoff_with_jitter_still_converges() {
    let writers = 6;
    let store = TestStore::new();
    let retry = RetryConfig::new()
        .with_max_attempts(writers)
        .with_backoff(1, 4)
        .with_jitter(true);
    let counters = store.counters_with_retry(retry);
    let id = unique_id("jitter");

    for result in run_writers(&counters, &id, writers) {
        result.unwrap();
    }
    assert_eq!(counters.get(&id).unwrap().unwrap().counter, writers as u64);
}
