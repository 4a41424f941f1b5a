//! Scalar values carried by entity properties and predicate operands.
use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

/// Typed value tagged with explicit type information so the wire format remains
/// unambiguous for the hosting store.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Value {
    /// UTF-8 string.
    String(String),
    /// 64-bit floating point number.
    Number(f64),
    /// Boolean.
    Boolean(bool),
}

/// Comparison domain of a [`Value`]. Values only order against values of the
/// same domain.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Domain {
    /// Strings, ordered bytewise.
    String,
    /// Numbers, see [`compare_numbers`].
    Numeric,
    /// Booleans; not indexed.
    Boolean,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Domain::String => "string",
            Domain::Numeric => "numeric",
            Domain::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Returns the comparison domain of the value.
    pub fn domain(&self) -> Domain {
        match self {
            Value::String(_) => Domain::String,
            Value::Number(_) => Domain::Numeric,
            Value::Boolean(_) => Domain::Boolean,
        }
    }

    /// Orders two values of the same domain.
    ///
    /// Fails with [`QueryError::DomainMismatch`] instead of coercing when the
    /// domains differ.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            (Value::Number(a), Value::Number(b)) => Ok(compare_numbers(*a, *b)),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(a.cmp(b)),
            _ => Err(QueryError::DomainMismatch {
                left: self.domain(),
                right: other.domain(),
            }),
        }
    }

    /// String payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric payload, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Plain JSON rendering; non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
        }
    }
}

/// Total order over numbers shared by predicate evaluation and the numeric
/// index: `-0.0 == 0.0`, NaN equals itself and sorts above every other number.
pub fn compare_numbers(a: f64, b: f64) -> Ordering {
    canonical_number(a).total_cmp(&canonical_number(b))
}

/// Collapses `-0.0` onto `0.0` and every NaN payload onto the positive quiet NaN.
pub(crate) fn canonical_number(n: f64) -> f64 {
    if n.is_nan() {
        f64::NAN
    } else if n == 0.0 {
        0.0
    } else {
        n
    }
}

/// Values of different domains are never equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.compare(other), Ok(Ordering::Equal))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}
