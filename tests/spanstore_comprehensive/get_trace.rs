//! Get-Trace Tests
//!
//! - Scenario A: a single written span comes back unchanged
//! - Spans are ordered by start time, then span id
//! - Unknown traces are `TraceNotFound`

use crate::*;

#[test]
fn test_scenario_a_single_span() {
    test_across_payload_modes("scenario_a", |store| {
        let s1 = span(1, 1, "checkout", "pay", 0);
        store.write_span(&s1).unwrap();

        let trace = store.get_trace(&ctx(), tid(1)).unwrap();
        assert_eq!(trace.trace_id, tid(1));
        assert_eq!(trace.spans, vec![s1]);
        trace
    });
}

#[test]
fn test_spans_sorted_by_start_then_id() {
    test_across_payload_modes("sorted", |store| {
        write_all(
            store,
            &[
                span(7, 30, "web", "c", 300),
                span(7, 20, "api", "b", 100),
                span(7, 10, "web", "a", 100),
                span(7, 40, "db", "d", 50),
            ],
        );
        let trace = store.get_trace(&ctx(), tid(7)).unwrap();
        assert_eq!(
            trace.span_ids(),
            vec![SpanId(40), SpanId(10), SpanId(20), SpanId(30)]
        );
        trace.span_ids()
    });
}

#[test]
fn test_trace_spanning_services_and_time() {
    test_across_payload_modes("cross_service", |store| {
        write_all(
            store,
            &[
                span(3, 1, "frontend", "GET /", 0),
                span(3, 2, "cart", "load", 1_000),
                span(3, 3, "db", "SELECT", 600_000_000),
            ],
        );
        store.get_trace(&ctx(), tid(3)).unwrap().span_ids()
    });
}

#[test]
fn test_other_traces_not_included() {
    test_across_payload_modes("isolation", |store| {
        write_all(
            store,
            &[span(1, 1, "web", "a", 0), span(2, 1, "web", "a", 0)],
        );
        let trace = store.get_trace(&ctx(), tid(1)).unwrap();
        assert!(trace.spans.iter().all(|s| s.trace_id == tid(1)));
        trace.spans.len()
    });
}

#[test]
fn test_unknown_trace_not_found() {
    test_across_payload_modes("not_found", |store| {
        store.write_span(&span(1, 1, "web", "a", 0)).unwrap();
        let err = store.get_trace(&ctx(), tid(99)).unwrap_err();
        assert!(matches!(err, Error::TraceNotFound(id) if id == tid(99)));
        err.kind()
    });
}

#[test]
fn test_high_bits_trace_id() {
    test_across_payload_modes("wide_id", |store| {
        let id = TraceId::new(0xdead_beef, 0x1234);
        let s = Span::new(id, SpanId(1), "web", "a", at(0));
        store.write_span(&s).unwrap();
        assert!(store.get_trace(&ctx(), TraceId::new(0, 0x1234)).is_err());
        store.get_trace(&ctx(), id).unwrap().spans
    });
}
