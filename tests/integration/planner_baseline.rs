//! Index-accelerated plans must select exactly what a full scan selects.

mod common;

use common::{init_tracing, pred, People};
use graphmat_query::index::ScanOrder;
use graphmat_query::query::{
    CompareOp, FallbackReason, FilterNode, FilterTree, IndexPlanner, PlannerOptions,
};
use graphmat_query::EntityId;
use proptest::prelude::*;

fn arb_op() -> impl Strategy<Value = CompareOp> {
    prop_oneof![
        Just(CompareOp::Lt),
        Just(CompareOp::Le),
        Just(CompareOp::Eq),
        Just(CompareOp::Ne),
        Just(CompareOp::Ge),
        Just(CompareOp::Gt),
    ]
}

fn arb_leaf() -> impl Strategy<Value = FilterNode> {
    prop_oneof![
        (arb_op(), -5i64..55).prop_map(|(op, age)| pred("n", "age", op, age)),
        (arb_op(), 0u64..120).prop_map(|(op, i)| pred("n", "name", op, format!("p{i:03}"))),
        (arb_op(), any::<bool>()).prop_map(|(op, flag)| pred("n", "active", op, flag)),
    ]
}

fn arb_filter() -> impl Strategy<Value = FilterNode> {
    arb_leaf().prop_recursive(4, 16, 2, |inner| {
        prop_oneof![
            3 => (inner.clone(), inner.clone()).prop_map(|(l, r)| FilterNode::and(l, r)),
            1 => (inner.clone(), inner).prop_map(|(l, r)| FilterNode::or(l, r)),
        ]
    })
}

fn baseline(people: &People, tree: &FilterTree) -> Vec<EntityId> {
    people
        .ids()
        .filter(|id| tree.evaluate(&people.bind("n", *id)).expect("same-domain filter"))
        .collect()
}

fn planned(people: &People, tree: &FilterTree, options: PlannerOptions) -> Vec<EntityId> {
    let registry = people.registry(&["age", "name"]);
    let planner = IndexPlanner::new(&registry, options);
    let plan = planner.plan(tree, "n", "Person");
    let mut found = plan
        .matches(tree, people.ids(), |id| people.bind("n", id))
        .expect("same-domain filter");
    found.sort();
    found
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn index_plan_matches_full_scan(root in arb_filter(), descending in any::<bool>()) {
        init_tracing();
        let people = People::generate(100);
        let tree = FilterTree::new(root);
        let order = if descending { ScanOrder::Descending } else { ScanOrder::Ascending };
        let options = PlannerOptions::default().scan_order(order);
        prop_assert_eq!(planned(&people, &tree, options), baseline(&people, &tree));
    }
}

#[test]
fn range_query_uses_index() {
    init_tracing();
    let people = People::generate(100);
    let registry = people.registry(&["age"]);
    let planner = IndexPlanner::new(&registry, PlannerOptions::default());
    let tree = FilterTree::new(FilterNode::and(
        pred("n", "age", CompareOp::Ge, 10i64),
        pred("n", "age", CompareOp::Lt, 12i64),
    ));
    let plan = planner.plan(&tree, "n", "Person");
    assert!(plan.is_index_scan());
    let ids: Vec<u64> = plan.into_cursor().unwrap().map(|id| id.0).collect();
    assert_eq!(ids, vec![10, 60, 11, 61]);
}

#[test]
fn disabled_index_scan_agrees_with_baseline() {
    let people = People::generate(60);
    let tree = FilterTree::new(FilterNode::and(
        pred("n", "age", CompareOp::Eq, 3i64),
        pred("n", "active", CompareOp::Eq, false),
    ));
    let disabled = planned(&people, &tree, PlannerOptions::default().index_scan(false));
    let enabled = planned(&people, &tree, PlannerOptions::default());
    assert_eq!(disabled, baseline(&people, &tree));
    assert_eq!(enabled, disabled);
    assert_eq!(enabled, vec![EntityId(3), EntityId(53)]);
}

#[test]
fn dropped_index_falls_back_to_full_scan() {
    let people = People::generate(40);
    let mut registry = people.registry(&["age"]);
    let tree = FilterTree::new(pred("n", "age", CompareOp::Eq, 3i64));
    {
        let planner = IndexPlanner::new(&registry, PlannerOptions::default());
        assert!(planner.plan(&tree, "n", "Person").is_index_scan());
    }
    registry.delete_index("Person", "age").unwrap();
    let planner = IndexPlanner::new(&registry, PlannerOptions::default());
    let plan = planner.plan(&tree, "n", "Person");
    assert_eq!(plan.fallback_reason(), Some(FallbackReason::IndexNotFound));
    assert_eq!(plan.explain()["op"], "FullScan");
    let found = plan
        .matches(&tree, people.ids(), |id| people.bind("n", id))
        .unwrap();
    assert_eq!(found, vec![EntityId(3)]);
}
