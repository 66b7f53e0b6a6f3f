//! Consistency Tests
//!
//! - find_trace_ids returns the ids of find_traces, in the same order
//! - Reserved labels always win over same-named user tags
//! - Payload backends agree on every read

use crate::*;

fn seed(store: &Store) {
    for t in 1..=8u64 {
        let service = if t % 2 == 0 { "web" } else { "api" };
        let mut s = span(t, 1, service, "GET", (t * 10) as i64);
        s.duration = Duration::from_millis(t * 3);
        s.tags.push(KeyValue::int64("shard", (t % 3) as i64));
        store.write_span(&s).unwrap();
        store
            .write_span(&span(t, 2, service, "child", (t * 10 + 1) as i64))
            .unwrap();
    }
}

#[test]
fn test_ids_match_traces() {
    let queries = vec![
        query("web", 0, 1_000),
        query("api", 0, 1_000).with_operation("GET"),
        query("web", 0, 1_000).with_tag("shard", "1"),
        query("web", 0, 1_000).with_limit(2),
        query("api", 0, 1_000).with_duration(Duration::from_millis(8), Duration::from_millis(20)),
        query("web", 35, 65),
    ];
    for backend in [PayloadBackend::Series, PayloadBackend::Blob] {
        let store = create_store(backend);
        seed(&store);
        for q in &queries {
            let traces = store.find_traces(&ctx(), Some(q)).unwrap();
            let ids = store.find_trace_ids(&ctx(), Some(q)).unwrap();
            assert_eq!(ids_of(&traces), ids, "{:?} {:?}", backend, q);
        }
    }
}

#[test]
fn test_find_results_identical_across_backends() {
    test_across_payload_modes("find_identical", |store| {
        seed(store);
        store
            .find_traces(&ctx(), Some(&query("web", 0, 1_000)))
            .unwrap()
    });
}

#[test]
fn test_reserved_label_collision_reserved_wins() {
    test_across_payload_modes("collision", |store| {
        let mut s = span(1, 1, "real-service", "real-op", 0);
        s.tags.push(KeyValue::string("__svc__", "fake-service"));
        s.tags.push(KeyValue::string("__op__", "fake-op"));
        s.tags.push(KeyValue::string("__traceid__", "ffff"));
        store.write_span(&s).unwrap();

        assert_eq!(store.get_services(&ctx()).unwrap(), vec!["real-service"]);
        assert_eq!(
            store.get_operations(&ctx(), "real-service").unwrap(),
            vec!["real-op"]
        );
        assert!(store.get_trace(&ctx(), "ffff".parse().unwrap()).is_err());

        let trace = store.get_trace(&ctx(), tid(1)).unwrap();
        assert_eq!(trace.spans[0].tags, s.tags, "user tags stay in the payload");
        trace
    });
}

#[test]
fn test_every_written_span_is_findable_by_its_service() {
    test_across_payload_modes("findable", |store| {
        seed(store);
        let mut found = 0;
        for service in store.get_services(&ctx()).unwrap() {
            for t in store
                .find_traces(&ctx(), Some(&query(&service, 0, 1_000)))
                .unwrap()
            {
                found += t.spans.len();
            }
        }
        assert_eq!(found, 16);
        found
    });
}

mod properties {
    use crate::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn arb_span() -> impl Strategy<Value = Span> {
        (
            1u64..5,
            any::<u64>(),
            prop::sample::select(vec!["web", "api", "db"]),
            prop::sample::select(vec!["GET", "POST", "query"]),
            0i64..1_000_000,
            0u64..10_000,
            prop::collection::vec(("[a-z]{1,6}", "[a-z0-9]{0,6}"), 0..4),
        )
            .prop_map(|(trace, id, service, op, offset, dur, tags)| {
                let mut s = span(trace, id, service, op, offset);
                s.duration = Duration::from_micros(dur);
                s.tags = tags
                    .into_iter()
                    .map(|(k, v)| KeyValue::string(k, v))
                    .collect();
                s
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_write_then_get_returns_written_spans(
            spans in prop::collection::vec(arb_span(), 1..24),
            blob in any::<bool>(),
        ) {
            let backend = if blob { PayloadBackend::Blob } else { PayloadBackend::Series };
            let store = create_store(backend);
            write_all(&store, &spans);

            let mut by_trace: BTreeMap<TraceId, Vec<Span>> = BTreeMap::new();
            for s in &spans {
                by_trace.entry(s.trace_id).or_default().push(s.clone());
            }
            for (id, mut expected) in by_trace {
                expected.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.span_id.cmp(&b.span_id)));
                let trace = store.get_trace(&ctx(), id).unwrap();
                prop_assert_eq!(trace.span_ids(), expected.iter().map(|s| s.span_id).collect::<Vec<_>>());
                prop_assert_eq!(trace.spans.len(), expected.len());
            }
        }

        #[test]
        fn prop_ids_agree_with_traces(
            spans in prop::collection::vec(arb_span(), 1..24),
            service in prop::sample::select(vec!["web", "api", "db"]),
            limit in 0usize..4,
        ) {
            let store = create_store(PayloadBackend::Series);
            write_all(&store, &spans);
            let q = query(service, 0, 1_000_000).with_limit(limit);
            let traces = store.find_traces(&ctx(), Some(&q)).unwrap();
            let ids = store.find_trace_ids(&ctx(), Some(&q)).unwrap();
            prop_assert_eq!(ids_of(&traces), ids);
        }
    }
}
