//! Validation Tests
//!
//! - Scenario C: empty service
//! - Scenario D: inverted time window
//! - Rule precedence and idempotence
//! - Validation never touches storage

use crate::*;

fn both_find_errors(store: &Store, q: Option<&TraceQueryParameters>) -> (Error, Error) {
    (
        store.find_traces(&ctx(), q).unwrap_err(),
        store.find_trace_ids(&ctx(), q).unwrap_err(),
    )
}

#[test]
fn test_scenario_c_service_not_set() {
    let store = create_store(PayloadBackend::Series);
    let (a, b) = both_find_errors(&store, Some(&query("", 0, 1_000)));
    assert!(matches!(a, Error::ServiceNameNotSet));
    assert!(matches!(b, Error::ServiceNameNotSet));
}

#[test]
fn test_scenario_d_min_after_max() {
    let store = create_store(PayloadBackend::Series);
    let (a, b) = both_find_errors(&store, Some(&query("A", 1_000, 0)));
    assert!(matches!(a, Error::StartTimeMinGreaterThanMax));
    assert!(matches!(b, Error::StartTimeMinGreaterThanMax));
}

#[test]
fn test_missing_query_malformed() {
    let store = create_store(PayloadBackend::Series);
    let (a, b) = both_find_errors(&store, None);
    assert!(matches!(a, Error::MalformedRequest));
    assert!(matches!(b, Error::MalformedRequest));
}

#[test]
fn test_missing_bound() {
    let store = create_store(PayloadBackend::Series);
    let mut q = query("A", 0, 10);
    q.start_time_max = None;
    assert!(matches!(
        store.find_traces(&ctx(), Some(&q)),
        Err(Error::StartAndEndTimeNotSet)
    ));
    q.start_time_max = Some(at(10));
    q.start_time_min = None;
    assert!(matches!(
        store.find_trace_ids(&ctx(), Some(&q)),
        Err(Error::StartAndEndTimeNotSet)
    ));
}

#[test]
fn test_duration_min_greater_than_max() {
    let store = create_store(PayloadBackend::Series);
    let q = query("A", 0, 10).with_duration(Duration::from_secs(2), Duration::from_secs(1));
    assert!(matches!(
        store.find_traces(&ctx(), Some(&q)),
        Err(Error::DurationMinGreaterThanMax)
    ));
}

#[test]
fn test_one_sided_duration_is_valid() {
    let store = create_store(PayloadBackend::Series);
    let q = query("A", 0, 10).with_duration(Duration::from_secs(2), Duration::ZERO);
    assert!(store.find_traces(&ctx(), Some(&q)).unwrap().is_empty());
}

#[test]
fn test_first_failing_rule_wins() {
    let store = create_store(PayloadBackend::Series);
    let mut q = query("", 10, 0).with_duration(Duration::from_secs(2), Duration::from_secs(1));
    assert!(matches!(
        store.find_traces(&ctx(), Some(&q)),
        Err(Error::ServiceNameNotSet)
    ));
    q.service_name = "A".into();
    assert!(matches!(
        store.find_traces(&ctx(), Some(&q)),
        Err(Error::StartTimeMinGreaterThanMax)
    ));
}

#[test]
fn test_validation_is_idempotent() {
    let store = create_store(PayloadBackend::Series);
    let q = query("A", 10, 0);
    for _ in 0..3 {
        let err = store.find_traces(&ctx(), Some(&q)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}

#[test]
fn test_validation_does_not_need_open_storage() {
    let store = create_store(PayloadBackend::Series);
    store.close().unwrap();
    assert!(matches!(
        store.find_traces(&ctx(), Some(&query("", 0, 10))),
        Err(Error::ServiceNameNotSet)
    ));
}

#[test]
fn test_reserved_tag_filter_not_supported() {
    let store = create_store(PayloadBackend::Series);
    for name in ["__svc__", "__op__", "__traceid__"] {
        let q = query("A", 0, 10).with_tag(name, "x");
        let err = store.find_traces(&ctx(), Some(&q)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported, "{}", name);
    }
}
