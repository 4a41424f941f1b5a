//! Scalar functions a predicate may apply to a constant operand.
//!
//! Functions are resolved and evaluated once, when the predicate is built, so
//! evaluation against each candidate entity only sees the cached result.

use crate::error::{QueryError, Result};
use crate::query::value::Value;

/// Scalar functions recognised in filter operands.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScalarFunction {
    /// `toUpper(s)`
    ToUpper,
    /// `toLower(s)`
    ToLower,
    /// `trim(s)`
    Trim,
    /// `ltrim(s)`
    LTrim,
    /// `rtrim(s)`
    RTrim,
    /// `reverse(s)`
    Reverse,
    /// `size(s)` / `length(s)`, in characters
    Size,
    /// `abs(n)`
    Abs,
    /// `ceil(n)`
    Ceil,
    /// `floor(n)`
    Floor,
    /// `round(n)`
    Round,
    /// `sign(n)`
    Sign,
    /// `sqrt(n)`
    Sqrt,
    /// `toString(x)`
    ToString,
    /// `toNumber(x)` / `toFloat(x)`
    ToNumber,
    /// `toInteger(x)`, truncating
    ToInteger,
}

impl ScalarFunction {
    /// Resolves a function by name, ignoring ASCII case.
    pub fn lookup(name: &str) -> Result<Self> {
        let func = match name.to_ascii_lowercase().as_str() {
            "toupper" => ScalarFunction::ToUpper,
            "tolower" => ScalarFunction::ToLower,
            "trim" => ScalarFunction::Trim,
            "ltrim" => ScalarFunction::LTrim,
            "rtrim" => ScalarFunction::RTrim,
            "reverse" => ScalarFunction::Reverse,
            "size" | "length" => ScalarFunction::Size,
            "abs" => ScalarFunction::Abs,
            "ceil" => ScalarFunction::Ceil,
            "floor" => ScalarFunction::Floor,
            "round" => ScalarFunction::Round,
            "sign" => ScalarFunction::Sign,
            "sqrt" => ScalarFunction::Sqrt,
            "tostring" => ScalarFunction::ToString,
            "tonumber" | "tofloat" => ScalarFunction::ToNumber,
            "tointeger" => ScalarFunction::ToInteger,
            _ => return Err(QueryError::UnknownFunction(name.to_owned())),
        };
        Ok(func)
    }

    /// Canonical spelling used when rendering filters.
    pub fn name(self) -> &'static str {
        match self {
            ScalarFunction::ToUpper => "toUpper",
            ScalarFunction::ToLower => "toLower",
            ScalarFunction::Trim => "trim",
            ScalarFunction::LTrim => "ltrim",
            ScalarFunction::RTrim => "rtrim",
            ScalarFunction::Reverse => "reverse",
            ScalarFunction::Size => "size",
            ScalarFunction::Abs => "abs",
            ScalarFunction::Ceil => "ceil",
            ScalarFunction::Floor => "floor",
            ScalarFunction::Round => "round",
            ScalarFunction::Sign => "sign",
            ScalarFunction::Sqrt => "sqrt",
            ScalarFunction::ToString => "toString",
            ScalarFunction::ToNumber => "toNumber",
            ScalarFunction::ToInteger => "toInteger",
        }
    }

    /// Applies the function to a constant argument.
    pub fn apply(self, arg: &Value) -> Result<Value> {
        match self {
            ScalarFunction::ToUpper => self.map_str(arg, |s| s.to_uppercase()),
            ScalarFunction::ToLower => self.map_str(arg, |s| s.to_lowercase()),
            ScalarFunction::Trim => self.map_str(arg, |s| s.trim().to_owned()),
            ScalarFunction::LTrim => self.map_str(arg, |s| s.trim_start().to_owned()),
            ScalarFunction::RTrim => self.map_str(arg, |s| s.trim_end().to_owned()),
            ScalarFunction::Reverse => self.map_str(arg, |s| s.chars().rev().collect()),
            ScalarFunction::Size => {
                let s = self.expect_str(arg)?;
                Ok(Value::Number(s.chars().count() as f64))
            }
            ScalarFunction::Abs => self.map_num(arg, f64::abs),
            ScalarFunction::Ceil => self.map_num(arg, f64::ceil),
            ScalarFunction::Floor => self.map_num(arg, f64::floor),
            ScalarFunction::Round => self.map_num(arg, f64::round),
            ScalarFunction::Sign => self.map_num(arg, |n| {
                if n == 0.0 || n.is_nan() {
                    n
                } else {
                    n.signum()
                }
            }),
            ScalarFunction::Sqrt => {
                let n = self.expect_num(arg)?;
                if n < 0.0 {
                    return Err(self.invalid(format!("negative operand {n}")));
                }
                Ok(Value::Number(n.sqrt()))
            }
            ScalarFunction::ToString => Ok(Value::String(match arg {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Boolean(b) => b.to_string(),
            })),
            ScalarFunction::ToNumber => self.parse_number(arg),
            ScalarFunction::ToInteger => match self.parse_number(arg)? {
                Value::Number(n) => Ok(Value::Number(n.trunc())),
                other => Ok(other),
            },
        }
    }

    fn parse_number(self, arg: &Value) -> Result<Value> {
        match arg {
            Value::Number(n) => Ok(Value::Number(*n)),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|err| self.invalid(format!("'{s}' is not a number: {err}"))),
            Value::Boolean(_) => Err(self.invalid("boolean operand".into())),
        }
    }

    fn map_str(self, arg: &Value, f: impl FnOnce(&str) -> String) -> Result<Value> {
        let s = self.expect_str(arg)?;
        Ok(Value::String(f(s)))
    }

    fn map_num(self, arg: &Value, f: impl FnOnce(f64) -> f64) -> Result<Value> {
        let n = self.expect_num(arg)?;
        Ok(Value::Number(f(n)))
    }

    fn expect_str(self, arg: &Value) -> Result<&str> {
        arg.as_str()
            .ok_or_else(|| self.invalid(format!("expected string, got {}", arg.domain())))
    }

    fn expect_num(self, arg: &Value) -> Result<f64> {
        arg.as_number()
            .ok_or_else(|| self.invalid(format!("expected number, got {}", arg.domain())))
    }

    fn invalid(self, reason: String) -> QueryError {
        QueryError::InvalidFunctionArgument {
            function: self.name(),
            reason,
        }
    }
}
