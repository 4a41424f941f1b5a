mod common;

use std::ops::Bound;

use common::{init_tracing, People};
use graphmat_query::index::{IndexRegistry, KeyRange, PropertyIndex, ScanOrder};
use graphmat_query::query::ast::IndexClause;
use graphmat_query::query::{Domain, Value};
use graphmat_query::{EntityId, QueryError};
use proptest::prelude::*;

fn scan_all(index: &PropertyIndex, domain: Domain, order: ScanOrder) -> Vec<EntityId> {
    index
        .range_scan(domain, Bound::Unbounded, Bound::Unbounded, order)
        .expect("scannable domain")
        .collect()
}

#[test]
fn ddl_round_trip() {
    init_tracing();
    let people = People::generate(20);
    let mut registry = IndexRegistry::new();
    let create = IndexClause::create("Person", "name");
    assert_eq!(create.to_string(), "CREATE INDEX ON :Person(name)");
    registry
        .apply(&create, |_, property| people.column(property))
        .unwrap();

    let index = registry.get("Person", "name").unwrap();
    assert_eq!(index.len(), 20);
    let first: Vec<_> = index
        .range_scan(
            Domain::String,
            Bound::Included(Value::from("p005")),
            Bound::Excluded(Value::from("p008")),
            ScanOrder::Ascending,
        )
        .unwrap()
        .collect();
    assert_eq!(first, vec![EntityId(5), EntityId(6), EntityId(7)]);

    registry.apply(&IndexClause::drop("Person", "name"), |_, p| people.column(p)).unwrap();
    assert!(matches!(
        registry.get("Person", "name"),
        Err(QueryError::IndexNotFound { .. })
    ));
}

#[test]
fn boolean_property_index_is_empty() {
    let people = People::generate(20);
    let registry = people.registry(&["active"]);
    let index = registry.get("Person", "active").unwrap();
    assert!(index.is_empty());
    assert!(scan_all(index, Domain::Numeric, ScanOrder::Ascending).is_empty());
}

#[test]
fn bound_from_wrong_domain_is_rejected() {
    let people = People::generate(5);
    let registry = people.registry(&["age"]);
    let err = registry
        .get("Person", "age")
        .unwrap()
        .range_scan(
            Domain::Numeric,
            Bound::Included(Value::from("a")),
            Bound::Unbounded,
            ScanOrder::Ascending,
        )
        .err()
        .expect("foreign bound");
    assert!(matches!(err, QueryError::DomainMismatch { .. }));
}

#[test]
fn signed_zero_and_nan_keys() {
    let index = PropertyIndex::build(
        "M",
        "x",
        [
            (EntityId(0), Value::from(f64::NAN)),
            (EntityId(1), Value::from(-0.0)),
            (EntityId(2), Value::from(0.0)),
            (EntityId(3), Value::from(f64::INFINITY)),
        ],
    );
    assert_eq!(index.distinct_keys(Domain::Numeric), 3);
    let zero = KeyRange::from_predicate(
        graphmat_query::query::CompareOp::Eq,
        &Value::from(0.0),
    )
    .unwrap();
    let ids: Vec<_> = index.scan(&zero, ScanOrder::Ascending).collect();
    assert_eq!(ids, vec![EntityId(1), EntityId(2)]);
    assert_eq!(
        scan_all(&index, Domain::Numeric, ScanOrder::Descending),
        vec![EntityId(0), EntityId(3), EntityId(1), EntityId(2)]
    );
}

proptest! {
    #[test]
    fn scan_is_sorted_and_complete(values in prop::collection::vec(-100i64..100, 0..64)) {
        let index = PropertyIndex::build(
            "L",
            "v",
            values.iter().enumerate().map(|(i, v)| (EntityId(i as u64), Value::from(*v))),
        );
        let ids = scan_all(&index, Domain::Numeric, ScanOrder::Ascending);
        prop_assert_eq!(ids.len(), values.len());
        let keys: Vec<i64> = ids.iter().map(|id| values[id.0 as usize]).collect();
        prop_assert!(keys.windows(2).all(|w| w[0] <= w[1]));
        // Ties keep insertion order.
        prop_assert!(ids
            .windows(2)
            .all(|w| values[w[0].0 as usize] != values[w[1].0 as usize] || w[0] < w[1]));
    }

    #[test]
    fn insert_then_remove_is_identity(
        values in prop::collection::vec(-20i64..20, 1..32),
        extra in -20i64..20,
    ) {
        let mut index = PropertyIndex::build(
            "L",
            "v",
            values.iter().enumerate().map(|(i, v)| (EntityId(i as u64), Value::from(*v))),
        );
        let before = scan_all(&index, Domain::Numeric, ScanOrder::Ascending);
        let fresh = EntityId(values.len() as u64);
        prop_assert!(index.insert(fresh, &Value::from(extra)));
        prop_assert!(index.remove(fresh, &Value::from(extra)));
        prop_assert_eq!(scan_all(&index, Domain::Numeric, ScanOrder::Ascending), before);
    }
}
