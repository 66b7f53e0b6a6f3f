//! Write Path Tests
//!
//! - Writes become visible to every read
//! - Rejected writes leave nothing behind
//! - Writes after close fail

use crate::*;

#[test]
fn test_write_then_get_returns_exact_span() {
    test_across_payload_modes("write_then_get", |store| {
        let s = rich_span(1, 2, 1, 0);
        store.write_span(&s).unwrap();
        let trace = store.get_trace(&ctx(), tid(1)).unwrap();
        assert_eq!(trace.spans, vec![s.clone()]);
        trace
    });
}

#[test]
fn test_write_visible_to_services_and_operations() {
    test_across_payload_modes("write_visible", |store| {
        store.write_span(&span(1, 1, "checkout", "pay", 0)).unwrap();
        (
            store.get_services(&ctx()).unwrap(),
            store.get_operations(&ctx(), "checkout").unwrap(),
        )
    });
}

#[test]
fn test_identical_span_written_twice_is_stored_twice() {
    test_across_payload_modes("duplicate_write", |store| {
        let s = span(1, 1, "checkout", "pay", 0);
        store.write_span(&s).unwrap();
        store.write_span(&s).unwrap();
        store.get_trace(&ctx(), tid(1)).unwrap().spans.len()
    });
}

#[test]
fn test_out_of_bounds_write_rejected() {
    for backend in [PayloadBackend::Series, PayloadBackend::Blob] {
        let store = Store::builder()
            .payload_backend(backend)
            .retention(Duration::from_secs(60))
            .ephemeral()
            .unwrap();
        let hour = 3_600_000_000;
        store.write_span(&span(1, 1, "web", "GET", 2 * hour)).unwrap();

        let err = store.write_span(&span(2, 1, "web", "GET", 0)).unwrap_err();
        assert!(err.is_engine_failure(), "{:?}", err);
        assert!(matches!(
            err,
            Error::Storage {
                operation: Operation::WriteSpan,
                source: StorageError::OutOfBounds { .. }
            }
        ));
        assert!(store.get_trace(&ctx(), tid(2)).unwrap_err().is_not_found());
    }
}

#[test]
fn test_write_after_close_fails() {
    let store = create_store(PayloadBackend::Series);
    store.close().unwrap();
    let err = store.write_span(&span(1, 1, "web", "GET", 0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineFailure);
    assert_eq!(err.operation(), Some(Operation::WriteSpan));
}

#[test]
fn test_span_without_service_is_still_indexed_by_trace() {
    test_across_payload_modes("no_service", |store| {
        store.write_span(&span(5, 1, "", "orphan", 0)).unwrap();
        (
            store.get_trace(&ctx(), tid(5)).unwrap().spans.len(),
            store.get_services(&ctx()).unwrap(),
        )
    });
}
