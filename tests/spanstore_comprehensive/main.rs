//! spanstore Comprehensive Test Suite
//!
//! Exercises the plugin surface end to end against both payload backends.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run the whole suite
//! cargo test --test spanstore_comprehensive
//!
//! # Run query tests only
//! cargo test --test spanstore_comprehensive find_traces::
//! ```

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

pub use spanstore::{
    micros_to_time, DependencyReader, Error, ErrorKind, KeyValue, Log, Operation, PayloadBackend,
    QueryContext, RefType, Span, SpanId, SpanReader, SpanRef, SpanWriter, StorageError, Store,
    Trace, TraceId, TraceQueryParameters,
};

// Test modules
pub mod cancellation;
pub mod concurrency;
pub mod consistency;
pub mod durability;
pub mod find_traces;
pub mod get_trace;
pub mod operations;
pub mod validation;
pub mod write_path;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Base timestamp of every scenario, in microseconds
pub const T0: i64 = 1_700_000_000_000_000;

/// `T0 + offset_micros` as a timestamp
pub fn at(offset_micros: i64) -> DateTime<Utc> {
    micros_to_time(T0 + offset_micros)
}

/// Trace id from a small number
pub fn tid(n: u64) -> TraceId {
    TraceId::new(0, n)
}

/// Span with no tags starting `offset_micros` after [`T0`]
pub fn span(trace: u64, id: u64, service: &str, op: &str, offset_micros: i64) -> Span {
    Span::new(tid(trace), SpanId(id), service, op, at(offset_micros))
}

/// Query for `service` over `[T0 + from, T0 + to]`
pub fn query(service: &str, from: i64, to: i64) -> TraceQueryParameters {
    TraceQueryParameters::new(service, at(from), at(to))
}

/// Background context
pub fn ctx() -> QueryContext {
    QueryContext::background()
}

/// Ephemeral store with the given payload backend
pub fn create_store(backend: PayloadBackend) -> Store {
    Store::builder()
        .payload_backend(backend)
        .ephemeral()
        .expect("Failed to create ephemeral store")
}

/// Shared ephemeral store for threaded tests
pub fn create_shared_store(backend: PayloadBackend) -> Arc<Store> {
    Arc::new(create_store(backend))
}

/// Run `f` against a fresh store per payload backend and check both agree
pub fn test_across_payload_modes<T, F>(name: &str, f: F)
where
    T: PartialEq + std::fmt::Debug,
    F: Fn(&Store) -> T,
{
    let series = f(&create_store(PayloadBackend::Series));
    let blob = f(&create_store(PayloadBackend::Blob));
    assert_eq!(series, blob, "{}: payload backends disagree", name);
}

/// Write every span, panicking on the first failure
pub fn write_all(store: &Store, spans: &[Span]) {
    for s in spans {
        store.write_span(s).expect("write_span failed");
    }
}

/// Trace ids of `traces`, in order
pub fn ids_of(traces: &[Trace]) -> Vec<TraceId> {
    traces.iter().map(|t| t.trace_id).collect()
}

/// A span carrying tags, a log and a parent reference
pub fn rich_span(trace: u64, id: u64, parent: u64, offset_micros: i64) -> Span {
    let mut s = span(trace, id, "checkout", "charge", offset_micros);
    s.duration = Duration::from_millis(12);
    s.flags = 1;
    s.references.push(SpanRef {
        trace_id: tid(trace),
        span_id: SpanId(parent),
        ref_type: RefType::ChildOf,
    });
    s.tags.push(KeyValue::string("http.method", "POST"));
    s.tags.push(KeyValue::int64("http.status_code", 502));
    s.tags.push(KeyValue::bool("error", true));
    s.process.tags.push(KeyValue::string("hostname", "pod-3"));
    s.logs.push(Log {
        timestamp: at(offset_micros + 100),
        fields: vec![KeyValue::string("event", "gateway timeout")],
    });
    s
}
