//! Collection Fan-out Tests
//!
//! Concurrent creates and deletes against one collection keep the index
//! consistent once every operation has completed.

use crate::common::*;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn concurrent_creates_land_in_index_once_each() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let store = TestStore::new();
    let counters = store.counters();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let counters = counters.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    counters
                        .create(Counter::new(&format!("t{}-{:03}", t, i), i as u64))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let ids = counters.index().list().unwrap();
    assert_eq!(ids.len(), THREADS * PER_THREAD);
    let page = counters.list(None, None).unwrap();
    assert_eq!(page.items.len(), ids.len());
    assert!(page.items.iter().zip(&ids).all(|(c, id)| &c.id == id));
}

#[test]
fn delete_many_races_with_creates_on_other_ids() {
    let store = TestStore::new();
    let counters = store.counters();
    let doomed: Vec<String> = (0..50).map(|i| format!("old-{:02}", i)).collect();
    for id in &doomed {
        counters.create(Counter::new(id, 0)).unwrap();
    }

    let creator = {
        let counters = counters.clone();
        thread::spawn(move || {
            for i in 0..50 {
                counters
                    .create(Counter::new(&format!("new-{:02}", i), 1))
                    .unwrap();
            }
        })
    };
    let removed = counters.delete_many(&doomed).unwrap();
    creator.join().unwrap();

    assert_eq!(removed, doomed.len());
    let ids = counters.index().list().unwrap();
    assert_eq!(ids.len(), 50);
    assert!(ids.iter().all(|id| id.starts_with("new-")));
}

#[test]
fn concurrent_event_appends_on_one_user() {
    use docket::api::{Event, EventType, UserEvents};

    let store = TestStore::new();
    let users = store.users();
    users.create(User::new("u1", "Ada")).unwrap();

    let writers = 4;
    let barrier = Arc::new(Barrier::new(writers));
    let handles: Vec<_> = (0..writers)
        .map(|w| {
            let users = users.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let mut user = users.entity("u1");
                barrier.wait();
                user.add_event(Event {
                    id: format!("e{}", w),
                    title: format!("event {}", w),
                    description: None,
                    kind: EventType::Task,
                    start_date: "2024-01-01".into(),
                })
                .unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let user = users.get("u1").unwrap().unwrap();
    assert_eq!(user.events.len(), writers);
}
