//! Filter tree for a query's WHERE clause.
//!
//! Leaves are [`PredicateNode`] comparisons, internal nodes are AND/OR
//! [`ConditionNode`]s. Each subtree is exclusively owned by its parent, so
//! dropping the root releases the whole tree.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{QueryError, Result};
use crate::query::functions::ScalarFunction;
use crate::query::value::Value;

/// Resolves `alias.property` references against the entities bound to the
/// row currently being filtered.
pub trait Bindings {
    /// Returns the value of `property` on the entity bound to `alias`, or
    /// `None` when the alias is unbound or the entity lacks the property.
    fn property(&self, alias: &str, property: &str) -> Option<&Value>;
}

/// Reference to a property of an aliased entity, e.g. `a.age`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PropertyRef {
    /// Entity alias declared by the pattern.
    pub alias: String,
    /// Property name.
    pub property: String,
}

impl PropertyRef {
    /// `alias.property`.
    pub fn new(alias: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            property: property.into(),
        }
    }
}

impl fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.property)
    }
}

/// One side of a comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// Literal value.
    Constant(Value),
    /// Property looked up on the bound entity at evaluation time.
    Property(PropertyRef),
    /// Scalar function applied to a literal; `result` is computed on construction.
    Function {
        /// Applied function.
        function: ScalarFunction,
        /// Literal argument as written.
        arg: Value,
        /// Folded value used in comparisons.
        result: Value,
    },
}

impl Operand {
    /// Literal operand.
    pub fn constant(value: impl Into<Value>) -> Self {
        Operand::Constant(value.into())
    }

    /// Property operand.
    pub fn property(alias: impl Into<String>, property: impl Into<String>) -> Self {
        Operand::Property(PropertyRef::new(alias, property))
    }

    /// Resolves `name` and evaluates it against `arg` once.
    pub fn function(name: &str, arg: impl Into<Value>) -> Result<Self> {
        let function = ScalarFunction::lookup(name)?;
        let arg = arg.into();
        let result = function.apply(&arg)?;
        Ok(Operand::Function {
            function,
            arg,
            result,
        })
    }

    /// Returns the property reference, if this operand is one.
    pub fn as_property(&self) -> Option<&PropertyRef> {
        match self {
            Operand::Property(prop) => Some(prop),
            _ => None,
        }
    }

    /// Returns the value of a constant or the cached result of a function.
    pub fn static_value(&self) -> Option<&Value> {
        match self {
            Operand::Constant(value) => Some(value),
            Operand::Function { result, .. } => Some(result),
            Operand::Property(_) => None,
        }
    }

    fn resolve<'a, B>(&'a self, bindings: &'a B) -> Option<&'a Value>
    where
        B: Bindings + ?Sized,
    {
        match self {
            Operand::Property(prop) => bindings.property(&prop.alias, &prop.property),
            other => other.static_value(),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Constant(value) => write!(f, "{value}"),
            Operand::Property(prop) => write!(f, "{prop}"),
            Operand::Function { function, arg, .. } => write!(f, "{}({arg})", function.name()),
        }
    }
}

/// Relational comparison operators.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CompareOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `>=`
    Ge,
    /// `>`
    Gt,
}

impl CompareOp {
    /// Operator obtained by swapping the operands: `a < b` is `b > a`.
    pub fn mirror(self) -> Self {
        match self {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
            CompareOp::Eq | CompareOp::Ne => self,
        }
    }

    /// Whether `left.cmp(right) == ordering` satisfies the operator.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Gt => ordering == Ordering::Greater,
        }
    }

    /// Operator as written in queries.
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Ge => ">=",
            CompareOp::Gt => ">",
        }
    }
}

/// Logical combinators for condition nodes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LogicalOp {
    /// Both subtrees hold.
    And,
    /// Either subtree holds.
    Or,
}

impl LogicalOp {
    /// Keyword as written in queries.
    pub fn keyword(self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

/// Leaf comparison. At least one operand is a property reference; when only
/// one is, it is kept on the left.
#[derive(Clone, Debug, PartialEq)]
pub struct PredicateNode {
    left: Operand,
    op: CompareOp,
    right: Operand,
}

impl PredicateNode {
    /// Builds a predicate, rejecting comparisons without any property operand.
    ///
    /// `5 < a.age` is stored as `a.age > 5`.
    pub fn new(left: Operand, op: CompareOp, right: Operand) -> Result<Self> {
        match (&left, &right) {
            (Operand::Property(_), _) => Ok(Self { left, op, right }),
            (_, Operand::Property(_)) => Ok(Self {
                left: right,
                op: op.mirror(),
                right: left,
            }),
            _ => Err(QueryError::InvalidOperandKind),
        }
    }

    /// Left operand; a property reference.
    pub fn left(&self) -> &Operand {
        &self.left
    }

    /// Comparison operator.
    pub fn op(&self) -> CompareOp {
        self.op
    }

    /// Right operand.
    pub fn right(&self) -> &Operand {
        &self.right
    }

    /// Property on the left-hand side; always present.
    pub fn subject(&self) -> Option<&PropertyRef> {
        self.left.as_property()
    }

    /// Whether both sides are property references.
    pub fn compares_properties(&self) -> bool {
        self.right.as_property().is_some()
    }

    /// Evaluates the comparison. A property missing on the bound entity makes
    /// the predicate false.
    pub fn evaluate<B>(&self, bindings: &B) -> Result<bool>
    where
        B: Bindings + ?Sized,
    {
        let (Some(left), Some(right)) = (self.left.resolve(bindings), self.right.resolve(bindings))
        else {
            return Ok(false);
        };
        Ok(self.op.holds(left.compare(right)?))
    }
}

impl fmt::Display for PredicateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op.symbol(), self.right)
    }
}

/// Internal node joining two subtrees.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionNode {
    /// Left subtree.
    pub left: Box<FilterNode>,
    /// Combinator.
    pub op: LogicalOp,
    /// Right subtree.
    pub right: Box<FilterNode>,
}

/// A node of the filter tree.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterNode {
    /// Comparison leaf.
    Predicate(PredicateNode),
    /// AND/OR of two subtrees.
    Condition(ConditionNode),
}

impl FilterNode {
    /// Builds a predicate leaf. See [`PredicateNode::new`].
    pub fn predicate(left: Operand, op: CompareOp, right: Operand) -> Result<Self> {
        PredicateNode::new(left, op, right).map(FilterNode::Predicate)
    }

    /// Joins two subtrees under `op`.
    pub fn condition(left: FilterNode, op: LogicalOp, right: FilterNode) -> Self {
        FilterNode::Condition(ConditionNode {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    /// `left AND right`.
    pub fn and(left: FilterNode, right: FilterNode) -> Self {
        Self::condition(left, LogicalOp::And, right)
    }

    /// `left OR right`.
    pub fn or(left: FilterNode, right: FilterNode) -> Self {
        Self::condition(left, LogicalOp::Or, right)
    }

    /// Evaluates the subtree, short-circuiting AND on false and OR on true.
    pub fn evaluate<B>(&self, bindings: &B) -> Result<bool>
    where
        B: Bindings + ?Sized,
    {
        match self {
            FilterNode::Predicate(pred) => pred.evaluate(bindings),
            FilterNode::Condition(cond) => {
                let left = cond.left.evaluate(bindings)?;
                match (cond.op, left) {
                    (LogicalOp::And, false) => Ok(false),
                    (LogicalOp::Or, true) => Ok(true),
                    _ => cond.right.evaluate(bindings),
                }
            }
        }
    }

    /// Iterates predicate leaves from left to right.
    pub fn predicates(&self) -> Predicates<'_> {
        Predicates { stack: vec![self] }
    }

    /// Operands of the top-level AND chain. An OR root is a single conjunct.
    pub fn conjuncts(&self) -> Vec<&FilterNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                FilterNode::Condition(cond) if cond.op == LogicalOp::And => {
                    stack.push(&cond.right);
                    stack.push(&cond.left);
                }
                other => out.push(other),
            }
        }
        out
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            FilterNode::Predicate(_) => 1,
            FilterNode::Condition(cond) => 1 + cond.left.depth().max(cond.right.depth()),
        }
    }

    fn fmt_child(&self, parent: LogicalOp, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Condition(cond) if cond.op != parent => write!(f, "({self})"),
            _ => write!(f, "{self}"),
        }
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Predicate(pred) => write!(f, "{pred}"),
            FilterNode::Condition(cond) => {
                cond.left.fmt_child(cond.op, f)?;
                write!(f, " {} ", cond.op.keyword())?;
                cond.right.fmt_child(cond.op, f)
            }
        }
    }
}

/// Left-to-right iterator over the predicate leaves of a subtree.
pub struct Predicates<'a> {
    stack: Vec<&'a FilterNode>,
}

impl<'a> Iterator for Predicates<'a> {
    type Item = &'a PredicateNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                FilterNode::Predicate(pred) => return Some(pred),
                FilterNode::Condition(cond) => {
                    self.stack.push(&cond.right);
                    self.stack.push(&cond.left);
                }
            }
        }
        None
    }
}

/// Root of a WHERE clause's filter.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterTree {
    root: FilterNode,
}

impl FilterTree {
    /// Tree rooted at `root`.
    pub fn new(root: FilterNode) -> Self {
        Self { root }
    }

    /// Root node.
    pub fn root(&self) -> &FilterNode {
        &self.root
    }

    /// Gives up the root node.
    pub fn into_root(self) -> FilterNode {
        self.root
    }

    /// Evaluates the filter against one row of bindings.
    pub fn evaluate<B>(&self, bindings: &B) -> Result<bool>
    where
        B: Bindings + ?Sized,
    {
        self.root.evaluate(bindings)
    }

    /// Every distinct alias referenced by any predicate, on either side.
    pub fn referenced_aliases(&self) -> BTreeSet<&str> {
        let mut aliases = BTreeSet::new();
        for pred in self.root.predicates() {
            for operand in [pred.left(), pred.right()] {
                if let Some(prop) = operand.as_property() {
                    aliases.insert(prop.alias.as_str());
                }
            }
        }
        aliases
    }

    /// Predicate leaves from left to right.
    pub fn predicates(&self) -> Predicates<'_> {
        self.root.predicates()
    }

    /// Number of predicate leaves.
    pub fn predicate_count(&self) -> usize {
        self.root.predicates().count()
    }

    /// Longest root-to-leaf path, in nodes.
    pub fn depth(&self) -> usize {
        self.root.depth()
    }
}

impl From<FilterNode> for FilterTree {
    fn from(root: FilterNode) -> Self {
        FilterTree::new(root)
    }
}

impl fmt::Display for FilterTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}
