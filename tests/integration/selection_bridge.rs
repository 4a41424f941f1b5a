mod common;

use common::{init_tracing, pred, People};
use graphmat_query::query::{CompareOp, FilterNode, FilterTree, IndexPlanner, PlannerOptions};
use graphmat_query::selection::{cursor_to_selection, SelectionMatrix};
use graphmat_query::{EntityId, QueryError};

#[test]
fn planned_cursor_becomes_diagonal_selection() {
    init_tracing();
    let people = People::generate(100);
    let registry = people.registry(&["age"]);
    let planner = IndexPlanner::new(&registry, PlannerOptions::default());
    let tree = FilterTree::new(pred("n", "age", CompareOp::Eq, 7i64));
    let mut cursor = planner
        .plan(&tree, "n", "Person")
        .into_cursor()
        .expect("index plan");
    let selection = cursor_to_selection(&mut cursor, 100).unwrap();
    assert_eq!(selection.nrows(), 100);
    assert_eq!(selection.ncols(), 100);
    assert_eq!(selection.iter().collect::<Vec<_>>(), vec![EntityId(7), EntityId(57)]);
    assert!(selection.get(57, 57));
    assert!(!selection.get(7, 57));
    assert!(cursor_to_selection(&mut cursor, 100).unwrap().is_empty());
}

#[test]
fn empty_plan_gives_empty_selection() {
    let people = People::generate(10);
    let registry = people.registry(&["age"]);
    let planner = IndexPlanner::new(&registry, PlannerOptions::default());
    let tree = FilterTree::new(FilterNode::and(
        pred("n", "age", CompareOp::Lt, 2i64),
        pred("n", "age", CompareOp::Gt, 5i64),
    ));
    let mut cursor = planner.plan(&tree, "n", "Person").into_cursor().unwrap();
    assert_eq!(cursor_to_selection(&mut cursor, 10).unwrap(), SelectionMatrix::new(10));
}

#[test]
fn universe_smaller_than_ids_fails() {
    let people = People::generate(30);
    let registry = people.registry(&["age"]);
    let planner = IndexPlanner::new(&registry, PlannerOptions::default());
    let tree = FilterTree::new(pred("n", "age", CompareOp::Ge, 0i64));
    let mut cursor = planner.plan(&tree, "n", "Person").into_cursor().unwrap();
    assert!(matches!(
        cursor_to_selection(&mut cursor, 10),
        Err(QueryError::IdentifierOutOfRange { universe: 10, .. })
    ));
}
