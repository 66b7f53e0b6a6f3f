//! Find-Traces Tests
//!
//! - Scenario B: spans of one trace group into one result
//! - Operation, tag and time-window filters
//! - Result limit
//! - Duration post-filter

use crate::*;

#[test]
fn test_scenario_b_one_trace_two_spans() {
    test_across_payload_modes("scenario_b", |store| {
        let s1 = span(1, 1, "A", "X", 0);
        let s2 = span(1, 2, "A", "Y", 1);
        write_all(store, &[s1.clone(), s2.clone()]);

        let traces = store.find_traces(&ctx(), Some(&query("A", -1, 2))).unwrap();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].trace_id, tid(1));
        assert_eq!(traces[0].spans, vec![s1, s2]);
        traces
    });
}

#[test]
fn test_only_matching_spans_returned() {
    test_across_payload_modes("matching_only", |store| {
        write_all(
            store,
            &[
                span(1, 1, "frontend", "GET /", 0),
                span(1, 2, "cart", "load", 10),
                span(1, 3, "frontend", "render", 20),
            ],
        );
        let traces = store
            .find_traces(&ctx(), Some(&query("frontend", 0, 100)))
            .unwrap();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].span_ids(), vec![SpanId(1), SpanId(3)]);
        traces
    });
}

#[test]
fn test_operation_filter() {
    test_across_payload_modes("operation_filter", |store| {
        write_all(
            store,
            &[
                span(1, 1, "web", "GET", 0),
                span(2, 1, "web", "POST", 10),
                span(3, 1, "web", "GET", 20),
            ],
        );
        let q = query("web", 0, 100).with_operation("GET");
        let ids = store.find_trace_ids(&ctx(), Some(&q)).unwrap();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(sorted, vec![tid(1), tid(3)]);
        sorted
    });
}

#[test]
fn test_tag_filters_are_conjunctive() {
    test_across_payload_modes("tag_and", |store| {
        let mut a = span(1, 1, "web", "GET", 0);
        a.tags.push(KeyValue::string("region", "eu"));
        a.tags.push(KeyValue::bool("error", true));
        let mut b = span(2, 1, "web", "GET", 10);
        b.tags.push(KeyValue::string("region", "eu"));
        b.tags.push(KeyValue::bool("error", false));
        write_all(store, &[a, b]);

        let q = query("web", 0, 100)
            .with_tag("region", "eu")
            .with_tag("error", "true");
        store.find_trace_ids(&ctx(), Some(&q)).unwrap()
    });
}

#[test]
fn test_process_tags_and_log_fields_are_searchable() {
    test_across_payload_modes("process_and_logs", |store| {
        store.write_span(&rich_span(4, 2, 1, 0)).unwrap();
        let by_host = query("checkout", 0, 10).with_tag("hostname", "pod-3");
        let by_event = query("checkout", 0, 10).with_tag("event", "gateway timeout");
        (
            store.find_trace_ids(&ctx(), Some(&by_host)).unwrap(),
            store.find_trace_ids(&ctx(), Some(&by_event)).unwrap(),
        )
    });
}

#[test]
fn test_time_window_is_inclusive() {
    test_across_payload_modes("window_inclusive", |store| {
        write_all(
            store,
            &[
                span(1, 1, "web", "GET", 100),
                span(2, 1, "web", "GET", 200),
                span(3, 1, "web", "GET", 301),
            ],
        );
        let mut ids = store
            .find_trace_ids(&ctx(), Some(&query("web", 100, 300)))
            .unwrap();
        ids.sort();
        assert_eq!(ids, vec![tid(1), tid(2)]);
        ids
    });
}

#[test]
fn test_no_match_is_empty_not_error() {
    test_across_payload_modes("no_match", |store| {
        store.write_span(&span(1, 1, "web", "GET", 0)).unwrap();
        (
            store.find_traces(&ctx(), Some(&query("api", 0, 10))).unwrap(),
            store
                .find_traces(&ctx(), Some(&query("web", 0, 10).with_tag("missing", "x")))
                .unwrap(),
        )
    });
}

#[test]
fn test_limit_caps_trace_count() {
    test_across_payload_modes("limit", |store| {
        for t in 1..=6 {
            store
                .write_span(&span(t, 1, "web", "GET", t as i64))
                .unwrap();
            store
                .write_span(&span(t, 2, "web", "GET", t as i64 + 100))
                .unwrap();
        }
        let q = query("web", 0, 1_000).with_limit(4);
        let traces = store.find_traces(&ctx(), Some(&q)).unwrap();
        assert_eq!(traces.len(), 4);
        assert!(traces.iter().all(|t| t.spans.len() == 2));
        traces.len()
    });
}

#[test]
fn test_duration_bounds_filter_spans() {
    test_across_payload_modes("duration", |store| {
        for (t, ms) in [(1u64, 5u64), (2, 50), (3, 500)] {
            let mut s = span(t, 1, "web", "GET", t as i64);
            s.duration = Duration::from_millis(ms);
            store.write_span(&s).unwrap();
        }
        let q = query("web", 0, 100)
            .with_duration(Duration::from_millis(10), Duration::from_millis(100));
        let traces = store.find_traces(&ctx(), Some(&q)).unwrap();
        assert_eq!(ids_of(&traces), vec![tid(2)]);

        let only_min = query("web", 0, 100).with_duration(Duration::from_millis(10), Duration::ZERO);
        let mut ids = store.find_trace_ids(&ctx(), Some(&only_min)).unwrap();
        ids.sort();
        assert_eq!(ids, vec![tid(2), tid(3)]);
        ids
    });
}
