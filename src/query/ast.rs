//! Clause-level abstract syntax tree handed over by the parser.
//!
//! A [`QueryAst`] owns at most one of each clause. The WHERE clause owns the
//! query's [`FilterTree`]; dropping the AST releases every clause with it.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{QueryError, Result};
use crate::query::filter::{FilterTree, PropertyRef};
use crate::query::options::PlannerOptions;
use crate::query::value::Value;

/// Direction selector for edge patterns.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EdgeDirection {
    /// From `src` to `dest`.
    #[default]
    Out,
    /// From `dest` to `src`.
    In,
    /// Either direction.
    Both,
}

/// Node element of a graph pattern, e.g. `(a:Person)`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NodePattern {
    /// Alias bound to matched nodes; `None` for anonymous nodes.
    pub alias: Option<String>,
    /// Optional label constraint.
    pub label: Option<String>,
}

impl NodePattern {
    /// Named node.
    pub fn new(alias: impl Into<String>, label: Option<&str>) -> Self {
        Self {
            alias: Some(alias.into()),
            label: label.map(str::to_owned),
        }
    }

    /// Node without an alias.
    pub fn anonymous(label: Option<&str>) -> Self {
        Self {
            alias: None,
            label: label.map(str::to_owned),
        }
    }
}

/// Edge element of a graph pattern connecting two nodes of the same pattern
/// by position.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EdgePattern {
    /// Alias bound to matched edges; `None` when anonymous.
    pub alias: Option<String>,
    /// Optional relationship type.
    pub relation: Option<String>,
    /// Position of the source node in [`Pattern::nodes`].
    pub src: usize,
    /// Position of the destination node in [`Pattern::nodes`].
    pub dest: usize,
    /// Traversal direction.
    pub direction: EdgeDirection,
}

/// Nodes and edges of a MATCH, CREATE, or MERGE clause.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Pattern {
    /// Nodes in declaration order.
    pub nodes: Vec<NodePattern>,
    /// Edges referring to `nodes` by position.
    pub edges: Vec<EdgePattern>,
}

impl Pattern {
    /// Pattern from its parts.
    pub fn new(nodes: Vec<NodePattern>, edges: Vec<EdgePattern>) -> Self {
        Self { nodes, edges }
    }

    /// Aliases introduced by the pattern.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        let nodes = self.nodes.iter().filter_map(|n| n.alias.as_deref());
        let edges = self.edges.iter().filter_map(|e| e.alias.as_deref());
        nodes.chain(edges)
    }

    /// Label attached to the node bound to `alias`, if any.
    pub fn label_of(&self, alias: &str) -> Option<&str> {
        self.nodes
            .iter()
            .find(|n| n.alias.as_deref() == Some(alias))
            .and_then(|n| n.label.as_deref())
    }

    fn alias_slots(&mut self) -> impl Iterator<Item = &mut Option<String>> {
        let nodes = self.nodes.iter_mut().map(|n| &mut n.alias);
        let edges = self.edges.iter_mut().map(|e| &mut e.alias);
        nodes.chain(edges)
    }
}

/// `MATCH pattern`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MatchClause {
    /// Pattern to match.
    pub pattern: Pattern,
}

/// WHERE clause; owns the filter tree.
#[derive(Clone, Debug, PartialEq)]
pub struct WhereClause {
    /// Filter applied to matched rows.
    pub filter: FilterTree,
}

/// `CREATE pattern`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CreateClause {
    /// Entities to create.
    pub pattern: Pattern,
}

/// `MERGE pattern`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MergeClause {
    /// Pattern matched or created.
    pub pattern: Pattern,
}

/// `SET alias.property = value`.
#[derive(Clone, Debug, PartialEq)]
pub struct SetItem {
    /// Property being assigned.
    pub target: PropertyRef,
    /// New value.
    pub value: Value,
}

/// `SET` assignments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SetClause {
    /// Assignments in source order.
    pub items: Vec<SetItem>,
}

/// `DELETE alias, ...`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeleteClause {
    /// Aliases of entities to delete.
    pub aliases: Vec<String>,
}

/// Projected entity or property, optionally renamed with `AS`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReturnItem {
    /// Projected alias.
    pub alias: String,
    /// Projected property; whole entity when `None`.
    pub property: Option<String>,
    /// Output name given with `AS`.
    pub output: Option<String>,
}

/// `RETURN` projection.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReturnClause {
    /// Projected items.
    pub items: Vec<ReturnItem>,
    /// Whether `DISTINCT` was given.
    pub distinct: bool,
}

/// Sort direction of `ORDER BY`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// Sort key; `alias` may name a pattern alias or a RETURN output.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderItem {
    /// Alias or RETURN output.
    pub alias: String,
    /// Sort property of `alias`, if any.
    pub property: Option<String>,
}

/// `ORDER BY` clause.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OrderClause {
    /// Sort keys, most significant first.
    pub items: Vec<OrderItem>,
    /// Direction applied to every key.
    pub direction: SortDirection,
}

/// `LIMIT n`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LimitClause {
    /// Maximum number of rows.
    pub count: u64,
}

/// Index DDL verb.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexOp {
    /// `CREATE INDEX`.
    Create,
    /// `DROP INDEX`.
    Drop,
}

/// `CREATE INDEX ON :label(property)` / `DROP INDEX ON :label(property)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexClause {
    /// Create or drop.
    pub op: IndexOp,
    /// Indexed label.
    pub label: String,
    /// Indexed property.
    pub property: String,
}

impl IndexClause {
    /// `CREATE INDEX ON :label(property)`.
    pub fn create(label: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            op: IndexOp::Create,
            label: label.into(),
            property: property.into(),
        }
    }

    /// `DROP INDEX ON :label(property)`.
    pub fn drop(label: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            op: IndexOp::Drop,
            label: label.into(),
            property: property.into(),
        }
    }
}

impl fmt::Display for IndexClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.op {
            IndexOp::Create => "CREATE",
            IndexOp::Drop => "DROP",
        };
        write!(f, "{verb} INDEX ON :{}({})", self.label, self.property)
    }
}

/// Top-level AST produced by the parser for one query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryAst {
    /// `MATCH` clause, if present.
    pub match_clause: Option<MatchClause>,
    /// `WHERE` clause, if present.
    pub where_clause: Option<WhereClause>,
    /// `CREATE` clause, if present.
    pub create_clause: Option<CreateClause>,
    /// `MERGE` clause, if present.
    pub merge_clause: Option<MergeClause>,
    /// `SET` clause, if present.
    pub set_clause: Option<SetClause>,
    /// `DELETE` clause, if present.
    pub delete_clause: Option<DeleteClause>,
    /// `RETURN` clause, if present.
    pub return_clause: Option<ReturnClause>,
    /// `ORDER BY` clause, if present.
    pub order_clause: Option<OrderClause>,
    /// `LIMIT` clause, if present.
    pub limit_clause: Option<LimitClause>,
    /// `CREATE INDEX` / `DROP INDEX` clause, if present.
    pub index_clause: Option<IndexClause>,
}

impl QueryAst {
    /// Filter tree of the WHERE clause, if any.
    pub fn filter(&self) -> Option<&FilterTree> {
        self.where_clause.as_ref().map(|w| &w.filter)
    }

    /// Whether executing the query leaves the graph and its indexes untouched.
    pub fn is_read_only(&self) -> bool {
        self.create_clause.is_none()
            && self.merge_clause.is_none()
            && self.set_clause.is_none()
            && self.delete_clause.is_none()
            && self.index_clause.is_none()
    }

    fn patterns(&self) -> impl Iterator<Item = &Pattern> {
        let m = self.match_clause.as_ref().map(|c| &c.pattern);
        let c = self.create_clause.as_ref().map(|c| &c.pattern);
        let g = self.merge_clause.as_ref().map(|c| &c.pattern);
        m.into_iter().chain(c).chain(g)
    }

    /// Aliases declared by MATCH, CREATE, and MERGE patterns.
    pub fn declared_aliases(&self) -> BTreeSet<&str> {
        self.patterns().flat_map(|p| p.aliases()).collect()
    }

    /// Label of the node bound to `alias` in any pattern.
    pub fn label_of(&self, alias: &str) -> Option<&str> {
        self.patterns().find_map(|p| p.label_of(alias))
    }

    /// Gives every unnamed node and edge a unique `anon_N` alias.
    pub fn name_anonymous_entities(&mut self) {
        let taken: BTreeSet<String> = self
            .declared_aliases()
            .into_iter()
            .map(str::to_owned)
            .collect();
        let mut next = 0usize;
        let patterns = [
            self.match_clause.as_mut().map(|c| &mut c.pattern),
            self.create_clause.as_mut().map(|c| &mut c.pattern),
            self.merge_clause.as_mut().map(|c| &mut c.pattern),
        ];
        for pattern in patterns.into_iter().flatten() {
            for slot in pattern.alias_slots().filter(|slot| slot.is_none()) {
                let name = loop {
                    let candidate = format!("anon_{next}");
                    next += 1;
                    if !taken.contains(&candidate) {
                        break candidate;
                    }
                };
                *slot = Some(name);
            }
        }
    }

    /// Validates the clause set with default limits.
    pub fn validate(&self) -> Result<()> {
        self.validate_with(&PlannerOptions::default())
    }

    /// Checks clause combinations, alias usage, and filter limits.
    pub fn validate_with(&self, options: &PlannerOptions) -> Result<()> {
        if self.index_clause.is_some() {
            let others = self.match_clause.is_some()
                || self.where_clause.is_some()
                || self.create_clause.is_some()
                || self.merge_clause.is_some()
                || self.set_clause.is_some()
                || self.delete_clause.is_some()
                || self.return_clause.is_some()
                || self.order_clause.is_some()
                || self.limit_clause.is_some();
            if others {
                return Err(invalid("INDEX clause cannot be combined with other clauses"));
            }
            return Ok(());
        }
        if self.match_clause.is_none()
            && self.create_clause.is_none()
            && self.merge_clause.is_none()
        {
            return Err(invalid(
                "query requires a MATCH, CREATE, MERGE, or INDEX clause",
            ));
        }

        let declared = self.declared_aliases();
        let check = |alias: &str, clause: &str| -> Result<()> {
            if declared.contains(alias) {
                Ok(())
            } else {
                Err(invalid(format!("{clause} references undefined alias '{alias}'")))
            }
        };

        if let Some(filter) = self.filter() {
            for alias in filter.referenced_aliases() {
                check(alias, "WHERE")?;
            }
            let depth = filter.depth();
            if depth > options.max_filter_depth {
                return Err(invalid(format!(
                    "WHERE clause depth {depth} exceeds {}",
                    options.max_filter_depth
                )));
            }
            let predicates = filter.predicate_count();
            if predicates > options.max_filter_predicates {
                return Err(invalid(format!(
                    "WHERE clause has {predicates} predicates, limit is {}",
                    options.max_filter_predicates
                )));
            }
        }
        if let Some(set) = &self.set_clause {
            for item in &set.items {
                check(&item.target.alias, "SET")?;
            }
        }
        if let Some(delete) = &self.delete_clause {
            for alias in &delete.aliases {
                check(alias, "DELETE")?;
            }
        }
        let mut outputs = BTreeSet::new();
        if let Some(ret) = &self.return_clause {
            for item in &ret.items {
                check(&item.alias, "RETURN")?;
                outputs.insert(item.output.as_deref().unwrap_or(&item.alias));
            }
        }
        if let Some(order) = &self.order_clause {
            for item in &order.items {
                if !outputs.contains(item.alias.as_str()) {
                    check(&item.alias, "ORDER BY")?;
                }
            }
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> QueryError {
    QueryError::InvalidQuery(reason.into())
}
