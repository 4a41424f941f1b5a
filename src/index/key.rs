//! Index keys and key intervals for the string and numeric sub-indexes.

use std::cmp::Ordering;
use std::ops::Bound;

use crate::error::{QueryError, Result};
use crate::query::filter::CompareOp;
use crate::query::value::{canonical_number, compare_numbers, Domain, Value};

/// Totally ordered numeric key. Uses the same ordering as predicate
/// evaluation so index scans never disagree with a full scan.
#[derive(Clone, Copy, Debug)]
pub struct NumberKey(f64);

impl NumberKey {
    /// Wraps `n`, folding `-0.0` and NaN payloads.
    pub fn new(n: f64) -> Self {
        NumberKey(canonical_number(n))
    }

    /// Canonical numeric value.
    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for NumberKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NumberKey {}

impl PartialOrd for NumberKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NumberKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_numbers(self.0, other.0)
    }
}

/// The key an entity currently occupies in one of the two sub-indexes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Slot {
    /// Key in the string sub-index.
    String(String),
    /// Key in the numeric sub-index.
    Number(NumberKey),
}

impl Slot {
    /// Maps a value onto its sub-index key. Booleans are not indexed.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Slot::String(s.clone())),
            Value::Number(n) => Some(Slot::Number(NumberKey::new(*n))),
            Value::Boolean(_) => None,
        }
    }
}

/// Interval over keys of one domain. Either bound may be open, closed, or
/// unbounded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interval<K> {
    /// Lower bound.
    pub lower: Bound<K>,
    /// Upper bound.
    pub upper: Bound<K>,
}

impl<K: Ord + Clone> Interval<K> {
    /// Interval containing every key.
    pub fn unbounded() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    /// Interval between two bounds.
    pub fn new(lower: Bound<K>, upper: Bound<K>) -> Self {
        Self { lower, upper }
    }

    /// Interval holding exactly `key`.
    pub fn point(key: K) -> Self {
        Self {
            lower: Bound::Included(key.clone()),
            upper: Bound::Included(key),
        }
    }

    /// Interval of keys `k` satisfying `k op key`. `<>` has no interval form.
    pub fn from_op(op: CompareOp, key: K) -> Option<Self> {
        let interval = match op {
            CompareOp::Eq => Self::point(key),
            CompareOp::Lt => Self::new(Bound::Unbounded, Bound::Excluded(key)),
            CompareOp::Le => Self::new(Bound::Unbounded, Bound::Included(key)),
            CompareOp::Gt => Self::new(Bound::Excluded(key), Bound::Unbounded),
            CompareOp::Ge => Self::new(Bound::Included(key), Bound::Unbounded),
            CompareOp::Ne => return None,
        };
        Some(interval)
    }

    /// Keys contained in both intervals.
    pub fn intersect(self, other: Self) -> Self {
        Self {
            lower: tighter(self.lower, other.lower, Ordering::Greater),
            upper: tighter(self.upper, other.upper, Ordering::Less),
        }
    }

    /// Whether no key can lie inside the interval.
    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Unbounded, _) | (_, Bound::Unbounded) => false,
            (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
            (Bound::Included(lo), Bound::Excluded(hi))
            | (Bound::Excluded(lo), Bound::Included(hi))
            | (Bound::Excluded(lo), Bound::Excluded(hi)) => lo >= hi,
        }
    }

    /// Whether `key` lies inside the interval.
    pub fn contains(&self, key: &K) -> bool {
        let above = match &self.lower {
            Bound::Unbounded => true,
            Bound::Included(lo) => key >= lo,
            Bound::Excluded(lo) => key > lo,
        };
        let below = match &self.upper {
            Bound::Unbounded => true,
            Bound::Included(hi) => key <= hi,
            Bound::Excluded(hi) => key < hi,
        };
        above && below
    }

    /// Borrowed bounds suitable for `BTreeMap::range`. Callers must check
    /// [`Interval::is_empty`] first; `BTreeMap::range` panics on inverted bounds.
    pub(crate) fn as_bounds(&self) -> (Bound<&K>, Bound<&K>) {
        (self.lower.as_ref(), self.upper.as_ref())
    }
}

/// Picks the more restrictive of two bounds on the same side. `prefer` is the
/// ordering that makes a key more restrictive (greater for lower bounds, less
/// for upper bounds).
fn tighter<K: Ord>(a: Bound<K>, b: Bound<K>, prefer: Ordering) -> Bound<K> {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other,
        (a, b) => {
            let ord = match (&a, &b) {
                (
                    Bound::Included(ka) | Bound::Excluded(ka),
                    Bound::Included(kb) | Bound::Excluded(kb),
                ) => ka.cmp(kb),
                _ => Ordering::Equal,
            };
            match ord {
                Ordering::Equal if matches!(a, Bound::Excluded(_)) => a,
                Ordering::Equal => b,
                ord if ord == prefer => a,
                _ => b,
            }
        }
    }
}

/// Interval tagged with the sub-index it applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyRange {
    /// Range over string keys.
    String(Interval<String>),
    /// Range over numeric keys.
    Number(Interval<NumberKey>),
}

impl KeyRange {
    /// Unbounded range over one sub-index.
    pub fn full(domain: Domain) -> Result<Self> {
        match domain {
            Domain::String => Ok(KeyRange::String(Interval::unbounded())),
            Domain::Numeric => Ok(KeyRange::Number(Interval::unbounded())),
            Domain::Boolean => Err(QueryError::UnindexedDomain(domain)),
        }
    }

    /// Builds a range from value bounds, all of which must belong to `domain`.
    pub fn from_bounds(domain: Domain, lower: Bound<Value>, upper: Bound<Value>) -> Result<Self> {
        match domain {
            Domain::String => Ok(KeyRange::String(Interval::new(
                map_bound(lower, domain, |v| v.as_str().map(str::to_owned))?,
                map_bound(upper, domain, |v| v.as_str().map(str::to_owned))?,
            ))),
            Domain::Numeric => Ok(KeyRange::Number(Interval::new(
                map_bound(lower, domain, |v| v.as_number().map(NumberKey::new))?,
                map_bound(upper, domain, |v| v.as_number().map(NumberKey::new))?,
            ))),
            Domain::Boolean => Err(QueryError::UnindexedDomain(domain)),
        }
    }

    /// Range of keys satisfying `key op value`; `None` for `<>` and booleans.
    pub fn from_predicate(op: CompareOp, value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Interval::from_op(op, s.clone()).map(KeyRange::String),
            Value::Number(n) => Interval::from_op(op, NumberKey::new(*n)).map(KeyRange::Number),
            Value::Boolean(_) => None,
        }
    }

    /// Domain of the sub-index the range applies to.
    pub fn domain(&self) -> Domain {
        match self {
            KeyRange::String(_) => Domain::String,
            KeyRange::Number(_) => Domain::Numeric,
        }
    }

    /// Intersects two ranges of the same domain; `None` when domains differ.
    pub fn intersect(self, other: KeyRange) -> Option<KeyRange> {
        match (self, other) {
            (KeyRange::String(a), KeyRange::String(b)) => Some(KeyRange::String(a.intersect(b))),
            (KeyRange::Number(a), KeyRange::Number(b)) => Some(KeyRange::Number(a.intersect(b))),
            _ => None,
        }
    }

    /// Whether no key can satisfy the range.
    pub fn is_empty(&self) -> bool {
        match self {
            KeyRange::String(interval) => interval.is_empty(),
            KeyRange::Number(interval) => interval.is_empty(),
        }
    }

    /// Whether `value` falls inside the range. Values of another domain never do.
    pub fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (KeyRange::String(interval), Value::String(s)) => interval.contains(s),
            (KeyRange::Number(interval), Value::Number(n)) => {
                interval.contains(&NumberKey::new(*n))
            }
            _ => false,
        }
    }
}

fn map_bound<K>(
    bound: Bound<Value>,
    domain: Domain,
    key: impl Fn(&Value) -> Option<K>,
) -> Result<Bound<K>> {
    let convert = |value: Value| {
        key(&value).ok_or(QueryError::DomainMismatch {
            left: domain,
            right: value.domain(),
        })
    };
    Ok(match bound {
        Bound::Included(v) => Bound::Included(convert(v)?),
        Bound::Excluded(v) => Bound::Excluded(convert(v)?),
        Bound::Unbounded => Bound::Unbounded,
    })
}
