//! Cancellation and Resource Release Tests
//!
//! - Cancelled or expired contexts abort every read
//! - Every read releases its querier, on success and on error

use crate::*;
use spanstore_engine::Database;
use spanstore_storage::{MemTsdb, TsdbOptions};

fn store_with_tsdb(backend: PayloadBackend) -> (Store, Arc<MemTsdb>) {
    let tsdb = Arc::new(MemTsdb::ephemeral(TsdbOptions::default()).unwrap());
    let db = Database::builder()
        .tsdb(tsdb.clone())
        .payload_backend(backend)
        .ephemeral()
        .unwrap();
    (Store::from_engine(Arc::new(db)), tsdb)
}

fn cancelled() -> QueryContext {
    let ctx = QueryContext::background();
    ctx.cancel();
    ctx
}

#[test]
fn test_cancelled_context_aborts_reads() {
    for backend in [PayloadBackend::Series, PayloadBackend::Blob] {
        let store = create_store(backend);
        store.write_span(&span(1, 1, "web", "GET", 0)).unwrap();
        let c = cancelled();
        let q = query("web", 0, 10);

        assert!(matches!(store.get_services(&c), Err(Error::Cancelled)));
        assert!(matches!(store.get_operations(&c, "web"), Err(Error::Cancelled)));
        assert!(matches!(store.get_trace(&c, tid(1)), Err(Error::Cancelled)));
        assert!(matches!(store.find_traces(&c, Some(&q)), Err(Error::Cancelled)));
        assert!(matches!(store.find_trace_ids(&c, Some(&q)), Err(Error::Cancelled)));
    }
}

#[test]
fn test_expired_deadline_aborts_reads() {
    let store = create_store(PayloadBackend::Series);
    store.write_span(&span(1, 1, "web", "GET", 0)).unwrap();
    let expired = QueryContext::with_timeout(Duration::ZERO);
    let err = store
        .find_traces(&expired, Some(&query("web", 0, 10)))
        .unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded));
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[test]
fn test_cancel_from_another_handle() {
    let store = create_store(PayloadBackend::Series);
    let ctx = QueryContext::background();
    let handle = ctx.clone();
    assert!(store.get_services(&ctx).is_ok());
    handle.cancel();
    assert!(matches!(store.get_services(&ctx), Err(Error::Cancelled)));
}

#[test]
fn test_validation_precedes_cancellation() {
    let store = create_store(PayloadBackend::Series);
    assert!(matches!(
        store.find_traces(&cancelled(), Some(&query("", 0, 10))),
        Err(Error::ServiceNameNotSet)
    ));
}

#[test]
fn test_queriers_released_after_reads() {
    for backend in [PayloadBackend::Series, PayloadBackend::Blob] {
        let (store, tsdb) = store_with_tsdb(backend);
        write_all(
            &store,
            &[span(1, 1, "web", "GET", 0), span(2, 1, "api", "POST", 5)],
        );
        let q = query("web", 0, 10);

        store.get_services(&ctx()).unwrap();
        store.get_operations(&ctx(), "").unwrap();
        store.get_trace(&ctx(), tid(1)).unwrap();
        store.find_traces(&ctx(), Some(&q)).unwrap();
        store.find_trace_ids(&ctx(), Some(&q)).unwrap();
        assert_eq!(tsdb.open_queriers(), 0, "{:?}", backend);
    }
}

#[test]
fn test_queriers_released_after_failed_reads() {
    let (store, tsdb) = store_with_tsdb(PayloadBackend::Series);
    store.write_span(&span(1, 1, "web", "GET", 0)).unwrap();

    let _ = store.get_trace(&ctx(), tid(9));
    let _ = store.find_traces(&ctx(), Some(&query("web", 0, 10).with_tag("__op__", "x")));

    let _ = store.find_traces(&cancelled(), Some(&query("web", 0, 10)));
    let _ = store.get_operations(&cancelled(), "web");

    assert_eq!(tsdb.open_queriers(), 0);
}
