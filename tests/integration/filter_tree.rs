mod common;

use common::{init_tracing, pred};
use graphmat_query::query::ast::{
    MatchClause, NodePattern, Pattern, ReturnClause, ReturnItem, WhereClause,
};
use graphmat_query::query::ast::QueryAst;
use graphmat_query::query::record::Record;
use graphmat_query::query::{CompareOp, FilterNode, FilterTree, Operand, PlannerOptions, Value};
use graphmat_query::QueryError;

fn adult_named_alice() -> FilterTree {
    FilterTree::new(FilterNode::and(
        pred("n", "age", CompareOp::Gt, 18i64),
        FilterNode::or(
            pred("n", "name", CompareOp::Eq, "alice"),
            FilterNode::predicate(
                Operand::property("m", "name"),
                CompareOp::Eq,
                Operand::function("toLower", "ALICE").unwrap(),
            )
            .unwrap(),
        ),
    ))
}

#[test]
fn evaluates_nested_conditions() {
    init_tracing();
    let tree = adult_named_alice();
    let mut row = Record::new();
    row.bind("n", [("age", Value::from(30i64)), ("name", Value::from("bob"))]);
    row.bind("m", [("name", Value::from("alice"))]);
    assert!(tree.evaluate(&row).unwrap());

    row.bind("m", [("name", Value::from("carol"))]);
    assert!(!tree.evaluate(&row).unwrap());

    row.bind("n", [("age", Value::from(12i64)), ("name", Value::from("alice"))]);
    assert!(!tree.evaluate(&row).unwrap());
}

#[test]
fn aliases_and_rendering() {
    let tree = adult_named_alice();
    assert_eq!(tree.referenced_aliases().into_iter().collect::<Vec<_>>(), vec!["m", "n"]);
    assert_eq!(tree.predicate_count(), 3);
    assert_eq!(tree.depth(), 3);
    assert_eq!(
        tree.to_string(),
        r#"n.age > 18 AND (n.name = "alice" OR m.name = toLower("ALICE"))"#
    );
}

#[test]
fn constant_on_left_is_normalized() {
    let node = FilterNode::predicate(
        Operand::constant(5i64),
        CompareOp::Lt,
        Operand::property("n", "age"),
    )
    .unwrap();
    let mut row = Record::new();
    row.bind("n", [("age", Value::from(7i64))]);
    assert!(node.evaluate(&row).unwrap());
    assert_eq!(node.to_string(), "n.age > 5");
}

#[test]
fn constant_only_predicate_is_rejected() {
    let err = FilterNode::predicate(
        Operand::constant(1i64),
        CompareOp::Eq,
        Operand::constant(1i64),
    )
    .unwrap_err();
    assert!(matches!(err, QueryError::InvalidOperandKind));
}

#[test]
fn cross_domain_comparison_errors() {
    let tree = FilterTree::new(pred("n", "age", CompareOp::Lt, "old"));
    let mut row = Record::new();
    row.bind("n", [("age", Value::from(3i64))]);
    assert!(matches!(
        tree.evaluate(&row),
        Err(QueryError::DomainMismatch { .. })
    ));
}

#[test]
fn where_clause_aliases_must_be_declared() {
    let pattern = Pattern::new(vec![NodePattern::new("n", Some("Person"))], Vec::new());
    let mut ast = QueryAst {
        match_clause: Some(MatchClause { pattern }),
        where_clause: Some(WhereClause {
            filter: adult_named_alice(),
        }),
        return_clause: Some(ReturnClause {
            items: vec![ReturnItem {
                alias: "n".into(),
                property: Some("name".into()),
                output: None,
            }],
            distinct: false,
        }),
        ..QueryAst::default()
    };
    assert!(matches!(ast.validate(), Err(QueryError::InvalidQuery(_))));

    ast.where_clause = Some(WhereClause {
        filter: FilterTree::new(pred("n", "age", CompareOp::Ge, 21i64)),
    });
    ast.validate().unwrap();
    assert!(ast.is_read_only());
    assert!(matches!(
        ast.validate_with(&PlannerOptions::default().max_filter_predicates(0)),
        Err(QueryError::InvalidQuery(_))
    ));
}
