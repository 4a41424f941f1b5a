#![forbid(unsafe_code)]

//! Query-side building blocks: values, filter trees, the clause model, and
//! index planning.

/// Typed property values and their total order.
pub mod value;

/// Scalar functions usable as filter operands.
pub mod functions;

/// Filter trees of predicates joined by AND/OR.
pub mod filter;

/// Entity bindings for filter evaluation.
pub mod record;

/// Clause-level query model.
///
/// Holds the parsed pieces of a query (MATCH, WHERE, RETURN, index DDL, ...)
/// and their cross-clause validation.
pub mod ast;

/// Planner configuration.
pub mod options;

/// Index-vs-scan planning for a filter.
pub mod planner;

pub use filter::{Bindings, CompareOp, FilterNode, FilterTree, LogicalOp, Operand, PredicateNode};
pub use options::PlannerOptions;
pub use planner::{FallbackReason, IndexPlanner, IndexScan, ScanPlan};
pub use value::{Domain, Value};
