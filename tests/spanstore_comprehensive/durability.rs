//! Durability Tests
//!
//! - Spans survive close and reopen, for every fsync mode and backend
//! - Retention drops old spans from the index
//! - Lockfile excludes a second writer

use crate::*;
use spanstore::EngineConfig;
use tempfile::TempDir;

fn open(dir: &TempDir, backend: PayloadBackend) -> Store {
    Store::builder()
        .path(dir.path())
        .payload_backend(backend)
        .open()
        .expect("Failed to open store")
}

#[test]
fn test_spans_survive_restart() {
    for backend in [PayloadBackend::Series, PayloadBackend::Blob] {
        let dir = TempDir::new().unwrap();
        let spans = vec![rich_span(1, 2, 1, 0), span(1, 1, "checkout", "root", -5), span(2, 1, "web", "GET", 50)];
        {
            let store = open(&dir, backend);
            write_all(&store, &spans);
            store.close().unwrap();
        }

        let store = open(&dir, backend);
        let trace = store.get_trace(&ctx(), tid(1)).unwrap();
        assert_eq!(trace.span_ids(), vec![SpanId(1), SpanId(2)], "{:?}", backend);
        assert_eq!(trace.spans[1], spans[0]);
        assert_eq!(store.get_services(&ctx()).unwrap(), vec!["checkout", "web"]);
        let ids = store
            .find_trace_ids(&ctx(), Some(&query("web", 0, 100)))
            .unwrap();
        assert_eq!(ids, vec![tid(2)]);
        store.close().unwrap();
    }
}

#[test]
fn test_strict_mode_survives_without_close() {
    let dir = TempDir::new().unwrap();
    {
        let store = Store::builder().path(dir.path()).strict().open().unwrap();
        store.write_span(&span(1, 1, "web", "GET", 0)).unwrap();
        drop(store);
    }
    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.get_trace(&ctx(), tid(1)).unwrap().spans.len(), 1);
}

#[test]
fn test_writes_continue_after_restart() {
    let dir = TempDir::new().unwrap();
    {
        let store = open(&dir, PayloadBackend::Blob);
        store.write_span(&span(1, 1, "web", "GET", 0)).unwrap();
        store.close().unwrap();
    }
    let store = open(&dir, PayloadBackend::Blob);
    store.write_span(&span(1, 2, "web", "GET", 10)).unwrap();
    assert_eq!(
        store.get_trace(&ctx(), tid(1)).unwrap().span_ids(),
        vec![SpanId(1), SpanId(2)]
    );
}

#[test]
fn test_no_durability_loses_data_on_restart() {
    let dir = TempDir::new().unwrap();
    {
        let store = Store::builder().path(dir.path()).no_durability().open().unwrap();
        store.write_span(&span(1, 1, "web", "GET", 0)).unwrap();
        store.close().unwrap();
    }
    let store = Store::open(dir.path()).unwrap();
    assert!(store.get_trace(&ctx(), tid(1)).unwrap_err().is_not_found());
}

#[test]
fn test_retention_drops_old_spans_from_index() {
    for backend in [PayloadBackend::Series, PayloadBackend::Blob] {
        let store = Store::builder()
            .payload_backend(backend)
            .retention(Duration::from_secs(60))
            .ephemeral()
            .unwrap();
        let hour = 3_600_000_000;
        store.write_span(&span(1, 1, "web", "GET", 0)).unwrap();
        store.write_span(&span(2, 1, "web", "GET", 2 * hour)).unwrap();

        let ids = store
            .find_trace_ids(&ctx(), Some(&query("web", -hour, 3 * hour)))
            .unwrap();
        assert_eq!(ids, vec![tid(2)], "{:?}", backend);
        if backend == PayloadBackend::Series {
            assert!(store.get_trace(&ctx(), tid(1)).unwrap_err().is_not_found());
        }
    }
}

#[test]
fn test_retention_applies_after_restart() {
    let dir = TempDir::new().unwrap();
    let hour = 3_600_000_000;
    {
        let store = open(&dir, PayloadBackend::Series);
        store.write_span(&span(1, 1, "web", "GET", 0)).unwrap();
        store.write_span(&span(2, 1, "web", "GET", 2 * hour)).unwrap();
        store.close().unwrap();
    }
    let store = Store::builder()
        .path(dir.path())
        .retention(Duration::from_secs(600))
        .open()
        .unwrap();
    assert!(store.get_trace(&ctx(), tid(1)).is_err());
    assert!(store.get_trace(&ctx(), tid(2)).is_ok());
}

#[test]
fn test_lockfile_excludes_second_open() {
    let dir = TempDir::new().unwrap();
    let first = Store::builder().path(dir.path()).lockfile(true).open().unwrap();
    let err = Store::builder()
        .path(dir.path())
        .lockfile(true)
        .open()
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Storage {
            operation: Operation::Open,
            source: StorageError::Locked(_)
        }
    ));

    first.close().unwrap();
    let again = Store::builder().path(dir.path()).lockfile(true).open().unwrap();
    again.close().unwrap();
}

#[test]
fn test_open_from_toml_config() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::from_toml_str(&format!(
        "storage_path = {:?}\npayload_backend = \"blob\"\nretention_secs = 120\n",
        dir.path().display().to_string()
    ))
    .unwrap();
    let store = Store::builder().config(config).open().unwrap();
    assert_eq!(store.payload_backend(), PayloadBackend::Blob);
    assert_eq!(store.path(), Some(dir.path()));
    assert_eq!(store.config().retention_secs, 120);
    store.close().unwrap();
}
