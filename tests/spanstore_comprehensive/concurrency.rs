//! Concurrency Tests
//!
//! - Concurrent writers to distinct and shared traces
//! - Readers running alongside writers

use crate::*;
use std::sync::Barrier;
use std::thread;

const NUM_WRITERS: usize = 8;
const SPANS_PER_THREAD: usize = 50;

#[test]
fn test_concurrent_writers_distinct_traces() {
    for backend in [PayloadBackend::Series, PayloadBackend::Blob] {
        let store = create_shared_store(backend);
        let barrier = Arc::new(Barrier::new(NUM_WRITERS));

        let handles: Vec<_> = (0..NUM_WRITERS)
            .map(|i| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for j in 0..SPANS_PER_THREAD {
                        let s = span(i as u64 + 1, j as u64, "web", "GET", j as i64);
                        store.write_span(&s).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        for i in 0..NUM_WRITERS {
            let trace = store.get_trace(&ctx(), tid(i as u64 + 1)).unwrap();
            assert_eq!(trace.spans.len(), SPANS_PER_THREAD, "{:?}", backend);
        }
    }
}

#[test]
fn test_concurrent_writers_same_trace_lose_nothing() {
    for backend in [PayloadBackend::Series, PayloadBackend::Blob] {
        let store = create_shared_store(backend);
        let barrier = Arc::new(Barrier::new(NUM_WRITERS));

        let handles: Vec<_> = (0..NUM_WRITERS)
            .map(|i| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for j in 0..SPANS_PER_THREAD {
                        let id = (i * SPANS_PER_THREAD + j) as u64;
                        let s = span(42, id, "web", "GET", id as i64);
                        store.write_span(&s).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let trace = store.get_trace(&ctx(), tid(42)).unwrap();
        let expected: Vec<SpanId> = (0..(NUM_WRITERS * SPANS_PER_THREAD) as u64)
            .map(SpanId)
            .collect();
        assert_eq!(trace.span_ids(), expected, "{:?}", backend);
    }
}

#[test]
fn test_readers_alongside_writers() {
    let store = create_shared_store(PayloadBackend::Blob);
    store.write_span(&span(1, 0, "web", "GET", 0)).unwrap();

    const NUM_READERS: usize = 4;
    let barrier = Arc::new(Barrier::new(NUM_READERS + 1));

    let writer = {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for j in 1..=SPANS_PER_THREAD {
                store
                    .write_span(&span(1, j as u64, "web", "GET", j as i64))
                    .unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..NUM_READERS)
        .map(|_| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut last = 0;
                for _ in 0..SPANS_PER_THREAD {
                    let n = store.get_trace(&ctx(), tid(1)).unwrap().spans.len();
                    assert!(n >= last, "span count went backwards");
                    last = n;
                    let found = store
                        .find_traces(&ctx(), Some(&query("web", 0, 1_000)))
                        .unwrap();
                    assert_eq!(ids_of(&found), vec![tid(1)]);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(
        store.get_trace(&ctx(), tid(1)).unwrap().spans.len(),
        SPANS_PER_THREAD + 1
    );
}
