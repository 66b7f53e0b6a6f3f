//! Service and Operation Listing Tests
//!
//! - Scenario E: operations across services without duplicates
//! - Services are sorted and distinct

use crate::*;
use std::collections::BTreeSet;

fn seed(store: &Store) {
    write_all(
        store,
        &[
            span(1, 1, "A", "x", 0),
            span(1, 2, "A", "y", 10),
            span(2, 1, "A", "x", 20),
            span(3, 1, "B", "y", 30),
            span(3, 2, "B", "z", 40),
        ],
    );
}

#[test]
fn test_scenario_e_union_without_duplicates() {
    test_across_payload_modes("scenario_e", |store| {
        seed(store);
        let all = store.get_operations(&ctx(), "").unwrap();
        let unique: BTreeSet<_> = all.iter().cloned().collect();
        assert_eq!(unique.len(), all.len(), "duplicates in {:?}", all);
        assert_eq!(
            unique,
            ["x", "y", "z"].iter().map(|s| s.to_string()).collect()
        );

        let a: BTreeSet<_> = store.get_operations(&ctx(), "A").unwrap().into_iter().collect();
        assert_eq!(a, ["x", "y"].iter().map(|s| s.to_string()).collect());
        (unique, a)
    });
}

#[test]
fn test_unknown_service_has_no_operations() {
    test_across_payload_modes("unknown_service", |store| {
        seed(store);
        store.get_operations(&ctx(), "C").unwrap()
    });
}

#[test]
fn test_services_sorted_distinct() {
    test_across_payload_modes("services", |store| {
        seed(store);
        store.write_span(&span(9, 1, "0-early", "boot", 50)).unwrap();
        let services = store.get_services(&ctx()).unwrap();
        assert_eq!(services, vec!["0-early", "A", "B"]);
        services
    });
}

#[test]
fn test_empty_store() {
    test_across_payload_modes("empty", |store| {
        (
            store.get_services(&ctx()).unwrap(),
            store.get_operations(&ctx(), "").unwrap(),
        )
    });
}
