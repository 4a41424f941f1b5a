//! Index-vs-scan planning for a filter over one aliased entity.
//!
//! The planner looks at the top-level AND chain of a filter, keeps the
//! comparisons between a property of the target alias and a constant, and,
//! when an index covers one of those properties, intersects their intervals
//! into a single index range. Anything the range cannot express stays with
//! general filter evaluation.

use std::fmt;
use std::ops::Bound;

use rustc_hash::FxHashSet;
use serde_json::json;
use smallvec::SmallVec;
use tracing::debug;

use crate::error::Result;
use crate::index::cursor::IndexCursor;
use crate::index::key::KeyRange;
use crate::index::property::PropertyIndex;
use crate::index::registry::IndexRegistry;
use crate::query::ast::QueryAst;
use crate::query::filter::{Bindings, CompareOp, FilterNode, FilterTree, PredicateNode};
use crate::query::options::PlannerOptions;
use crate::query::value::Value;
use crate::types::EntityId;

/// Why the planner declined to use an index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FallbackReason {
    /// Index scans are disabled by [`PlannerOptions::index_scan`].
    Disabled,
    /// The query has no WHERE clause.
    NoFilter,
    /// The alias is not bound to a labelled node.
    Unlabeled,
    /// No conjunct compares a property of the alias against a constant.
    NoCandidates,
    /// Every candidate property also appears under an OR.
    Disjunction,
    /// None of the candidate properties is indexed.
    IndexNotFound,
    /// Candidates only use `<>` or boolean constants.
    NoIndexableDomain,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FallbackReason::Disabled => "index scans disabled",
            FallbackReason::NoFilter => "no filter",
            FallbackReason::Unlabeled => "alias has no label",
            FallbackReason::NoCandidates => "no indexable predicate",
            FallbackReason::Disjunction => "predicates combined with OR",
            FallbackReason::IndexNotFound => "no index on filtered properties",
            FallbackReason::NoIndexableDomain => "no string or numeric range",
        };
        f.write_str(text)
    }
}

/// Index-backed candidate enumeration.
pub struct IndexScan<'r> {
    /// Label whose index is scanned.
    pub label: String,
    /// Indexed property.
    pub property: String,
    /// Intersection of every encoded predicate.
    pub range: KeyRange,
    /// Open cursor over `range`.
    pub cursor: IndexCursor<'r>,
    /// Whether candidates must still be checked against the full filter.
    pub residual: bool,
}

/// Outcome of planning.
pub enum ScanPlan<'r> {
    /// Enumerate candidates through an index.
    Index(IndexScan<'r>),
    /// The predicates on `property` cannot all hold; nothing matches and no
    /// index or store access is needed.
    Empty {
        /// Label being filtered.
        label: String,
        /// Property with the contradictory predicates.
        property: String,
    },
    /// Evaluate the filter against every entity of the label.
    FullScan {
        /// Why no index is used.
        reason: FallbackReason,
    },
}

impl<'r> ScanPlan<'r> {
    /// Whether candidates come from an index.
    pub fn is_index_scan(&self) -> bool {
        matches!(self, ScanPlan::Index(_))
    }

    /// Whether the plan provably selects nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, ScanPlan::Empty { .. })
    }

    /// Reason for a full scan, if this is one.
    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            ScanPlan::FullScan { reason } => Some(*reason),
            _ => None,
        }
    }

    /// Cursor over the candidates; empty for [`ScanPlan::Empty`] and `None`
    /// when the caller must scan.
    pub fn into_cursor(self) -> Option<IndexCursor<'r>> {
        match self {
            ScanPlan::Index(scan) => Some(scan.cursor),
            ScanPlan::Empty { .. } => Some(IndexCursor::empty()),
            ScanPlan::FullScan { .. } => None,
        }
    }

    /// Explain document describing the chosen access path.
    pub fn explain(&self) -> serde_json::Value {
        match self {
            ScanPlan::Index(scan) => json!({
                "op": "IndexScan",
                "label": scan.label,
                "property": scan.property,
                "domain": scan.range.domain().to_string(),
                "range": range_json(&scan.range),
                "order": serde_json::to_value(scan.cursor.order()).unwrap_or_default(),
                "residual": scan.residual,
            }),
            ScanPlan::Empty { label, property } => json!({
                "op": "Empty",
                "label": label,
                "property": property,
            }),
            ScanPlan::FullScan { reason } => json!({
                "op": "FullScan",
                "reason": reason.to_string(),
            }),
        }
    }

    /// Runs the plan to completion.
    ///
    /// Index candidates are checked against `filter` when the range does not
    /// encode it entirely; a full scan checks every id from `universe`.
    /// `bind` produces the bindings for one entity.
    pub fn matches<U, F, B>(
        self,
        filter: &FilterTree,
        universe: U,
        mut bind: F,
    ) -> Result<Vec<EntityId>>
    where
        U: IntoIterator<Item = EntityId>,
        F: FnMut(EntityId) -> B,
        B: Bindings,
    {
        let mut out = Vec::new();
        match self {
            ScanPlan::Empty { .. } => {}
            ScanPlan::Index(scan) if !scan.residual => out.extend(scan.cursor),
            ScanPlan::Index(scan) => {
                for id in scan.cursor {
                    if filter.evaluate(&bind(id))? {
                        out.push(id);
                    }
                }
            }
            ScanPlan::FullScan { .. } => {
                for id in universe {
                    if filter.evaluate(&bind(id))? {
                        out.push(id);
                    }
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Debug for ScanPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanPlan::Index(scan) => f
                .debug_struct("Index")
                .field("label", &scan.label)
                .field("property", &scan.property)
                .field("range", &scan.range)
                .field("residual", &scan.residual)
                .finish(),
            ScanPlan::Empty { label, property } => f
                .debug_struct("Empty")
                .field("label", label)
                .field("property", property)
                .finish(),
            ScanPlan::FullScan { reason } => {
                f.debug_struct("FullScan").field("reason", reason).finish()
            }
        }
    }
}

fn range_json(range: &KeyRange) -> serde_json::Value {
    match range {
        KeyRange::String(interval) => json!({
            "lower": bound_json(&interval.lower, |key| Value::from(key.as_str())),
            "upper": bound_json(&interval.upper, |key| Value::from(key.as_str())),
        }),
        KeyRange::Number(interval) => json!({
            "lower": bound_json(&interval.lower, |key| Value::Number(key.get())),
            "upper": bound_json(&interval.upper, |key| Value::Number(key.get())),
        }),
    }
}

fn bound_json<K>(bound: &Bound<K>, value: impl Fn(&K) -> Value) -> serde_json::Value {
    match bound {
        Bound::Included(key) => json!({ "included": value(key).to_json() }),
        Bound::Excluded(key) => json!({ "excluded": value(key).to_json() }),
        Bound::Unbounded => serde_json::Value::Null,
    }
}

/// `alias.property op value` conjunct eligible for index encoding.
struct Candidate<'t> {
    property: &'t str,
    op: CompareOp,
    value: &'t Value,
}

impl<'t> Candidate<'t> {
    fn from_predicate(pred: &'t PredicateNode, alias: &str) -> Option<Self> {
        let subject = pred.subject()?;
        if subject.alias != alias {
            return None;
        }
        let value = pred.right().static_value()?;
        Some(Self {
            property: &subject.property,
            op: pred.op(),
            value,
        })
    }

    fn range(&self) -> Option<KeyRange> {
        KeyRange::from_predicate(self.op, self.value)
    }
}

/// Intersects the encodable candidates on `property` within the domain of
/// the first one. Returns the range and how many predicates it encodes.
fn property_range(candidates: &[Candidate<'_>], property: &str) -> Option<(KeyRange, usize)> {
    let mut ranges = candidates
        .iter()
        .filter(|c| c.property == property)
        .filter_map(Candidate::range);
    let mut range = ranges.next()?;
    let domain = range.domain();
    let mut encoded = 1;
    for next in ranges.filter(|r| r.domain() == domain) {
        encoded += 1;
        range = match range.clone().intersect(next) {
            Some(narrowed) => narrowed,
            None => range,
        };
    }
    Some((range, encoded))
}

/// Chooses between index-accelerated and full-scan evaluation.
pub struct IndexPlanner<'r> {
    registry: &'r IndexRegistry,
    options: PlannerOptions,
}

impl<'r> IndexPlanner<'r> {
    /// Planner over the indexes of `registry`.
    pub fn new(registry: &'r IndexRegistry, options: PlannerOptions) -> Self {
        Self { registry, options }
    }

    /// Options in effect.
    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    /// Plans the WHERE clause of `ast` for the entities bound to `alias`,
    /// using the label the pattern attaches to it.
    pub fn plan_query(&self, ast: &QueryAst, alias: &str) -> ScanPlan<'r> {
        let Some(filter) = ast.filter() else {
            return self.fallback(alias, FallbackReason::NoFilter);
        };
        let Some(label) = ast.label_of(alias) else {
            return self.fallback(alias, FallbackReason::Unlabeled);
        };
        self.plan(filter, alias, label)
    }

    /// Plans `filter` for entities of `label` bound to `alias`.
    pub fn plan(&self, filter: &FilterTree, alias: &str, label: &str) -> ScanPlan<'r> {
        if !self.options.index_scan {
            return self.fallback(alias, FallbackReason::Disabled);
        }

        let mut candidates = Vec::new();
        let mut tainted: FxHashSet<&str> = FxHashSet::default();
        for conjunct in filter.root().conjuncts() {
            match conjunct {
                FilterNode::Predicate(pred) => {
                    candidates.extend(Candidate::from_predicate(pred, alias));
                }
                // Top-level ANDs are flattened, so this is an OR subtree.
                FilterNode::Condition(_) => {
                    for pred in conjunct.predicates() {
                        for operand in [pred.left(), pred.right()] {
                            if let Some(prop) = operand.as_property() {
                                if prop.alias == alias {
                                    tainted.insert(&prop.property);
                                }
                            }
                        }
                    }
                }
            }
        }
        if candidates.is_empty() {
            let reason = if tainted.is_empty() {
                FallbackReason::NoCandidates
            } else {
                FallbackReason::Disjunction
            };
            return self.fallback(alias, reason);
        }
        candidates.retain(|c| !tainted.contains(c.property));
        if candidates.is_empty() {
            return self.fallback(alias, FallbackReason::Disjunction);
        }

        let mut properties: SmallVec<[&str; 4]> = SmallVec::new();
        for candidate in &candidates {
            if !properties.contains(&candidate.property) {
                properties.push(candidate.property);
            }
        }
        // Contradictions need neither an index nor a scan.
        for &property in &properties {
            let Some((range, _)) = property_range(&candidates, property) else {
                continue;
            };
            if range.is_empty() {
                debug!(alias, label, property, "planner.empty_interval");
                return ScanPlan::Empty {
                    label: label.to_owned(),
                    property: property.to_owned(),
                };
            }
        }

        let Some((index, property)) = self.choose_index(&candidates, &properties, label) else {
            return self.fallback(alias, FallbackReason::IndexNotFound);
        };
        let Some((range, encoded)) = property_range(&candidates, property) else {
            return self.fallback(alias, FallbackReason::NoIndexableDomain);
        };
        let domain = range.domain();

        let residual = filter.predicate_count() != encoded;
        debug!(
            alias,
            label,
            property,
            %domain,
            encoded,
            residual,
            "planner.index_scan"
        );
        ScanPlan::Index(IndexScan {
            label: label.to_owned(),
            property: property.to_owned(),
            cursor: index.scan(&range, self.options.scan_order),
            range,
            residual,
        })
    }

    /// Picks the first indexed property with an equality candidate, else the
    /// first indexed property, in order of appearance.
    fn choose_index<'t>(
        &self,
        candidates: &[Candidate<'t>],
        properties: &[&'t str],
        label: &str,
    ) -> Option<(&'r PropertyIndex, &'t str)> {
        let registry: &'r IndexRegistry = self.registry;
        let mut indexed: SmallVec<[(&'r PropertyIndex, &'t str); 4]> = SmallVec::new();
        for &property in properties {
            match registry.get(label, property) {
                Ok(index) => indexed.push((index, property)),
                Err(err) => debug!(label, property, %err, "planner.index_missing"),
            }
        }
        let has_eq = |property: &str| {
            candidates
                .iter()
                .any(|c| c.property == property && c.op == CompareOp::Eq && c.range().is_some())
        };
        indexed
            .iter()
            .copied()
            .find(|(_, property)| has_eq(property))
            .or_else(|| indexed.first().copied())
    }

    fn fallback(&self, alias: &str, reason: FallbackReason) -> ScanPlan<'r> {
        debug!(alias, %reason, "planner.full_scan");
        ScanPlan::FullScan { reason }
    }
}
