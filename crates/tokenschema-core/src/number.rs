//! Numeric semantics shared by schema keywords and token values
//!
//! Integers are kept exact (machine width or arbitrary precision) and are
//! only compared against floats through exact conversions, never by casting
//! the integer to `f64`.
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive, Zero};
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Relative tolerance (in units of `f64::EPSILON`) for float divisibility
const MULTIPLE_OF_ULPS: f64 = 20.0;

/// A JSON number in the most precise representation available
#[derive(Debug, Clone, PartialEq)]
pub enum JsonNumber {
    Integer(i64),
    BigInteger(BigInt),
    Float(f64),
}

impl JsonNumber {
    /// Convert a parsed `serde_json` number, keeping big integers exact
    pub fn from_json(number: &Number) -> Option<Self> {
        if let Some(i) = number.as_i64() {
            return Some(Self::Integer(i));
        }
        let text = number.to_string();
        if !text.contains(['.', 'e', 'E']) {
            if let Ok(big) = BigInt::from_str(&text) {
                return Some(Self::BigInteger(big));
            }
        }
        number.as_f64().map(Self::Float)
    }

    /// Extract a number from a JSON value
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Self::from_json(n),
            _ => None,
        }
    }

    /// Convert back to a JSON value
    pub fn to_value(&self) -> Value {
        match self {
            Self::Integer(i) => Value::from(*i),
            Self::BigInteger(b) => Number::from_str(&b.to_string())
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        }
    }

    /// Whether the number has no fractional part
    pub fn is_integer(&self) -> bool {
        match self {
            Self::Integer(_) | Self::BigInteger(_) => true,
            Self::Float(f) => f.is_finite() && f.fract() == 0.0,
        }
    }

    /// Whether the value was produced as a float token
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float(_))
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Self::Integer(i) => *i == 0,
            Self::BigInteger(b) => b.is_zero(),
            Self::Float(f) => *f == 0.0,
        }
    }

    /// Exact integer value, if the number is integral
    fn to_bigint(&self) -> Option<BigInt> {
        match self {
            Self::Integer(i) => Some(BigInt::from(*i)),
            Self::BigInteger(b) => Some(b.clone()),
            Self::Float(f) if f.is_finite() && f.fract() == 0.0 => BigInt::from_f64(*f),
            Self::Float(_) => None,
        }
    }

    fn to_f64(&self) -> f64 {
        match self {
            Self::Integer(i) => *i as f64,
            Self::BigInteger(b) => b.to_f64().unwrap_or(f64::NAN),
            Self::Float(f) => *f,
        }
    }

    /// Exact comparison; `None` only when a NaN is involved
    pub fn compare(&self, other: &JsonNumber) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Float(f), exact) => compare_exact_float(exact, *f).map(Ordering::reverse),
            (exact, Self::Float(f)) => compare_exact_float(exact, *f),
            (a, b) => Some(a.to_bigint()?.cmp(&b.to_bigint()?)),
        }
    }

    /// Whether `self` is an exact multiple of `divisor`
    pub fn is_multiple_of(&self, divisor: &JsonNumber) -> bool {
        if divisor.is_zero() {
            return true;
        }
        if self.is_zero() {
            return true;
        }

        if let (Some(value), Some(divisor)) = (self.to_bigint(), divisor.to_bigint()) {
            return (value % divisor).is_zero();
        }

        // A non-integral divisor cannot evenly divide a nonzero big integer
        if matches!(self, Self::BigInteger(_)) {
            return false;
        }

        let quotient = self.to_f64() / divisor.to_f64();
        if !quotient.is_finite() {
            return false;
        }
        let tolerance = quotient.abs().max(1.0) * f64::EPSILON * MULTIPLE_OF_ULPS;
        (quotient - quotient.round()).abs() <= tolerance
    }
}

fn compare_exact_float(exact: &JsonNumber, float: f64) -> Option<Ordering> {
    if float.is_nan() {
        return None;
    }
    if float == f64::INFINITY {
        return Some(Ordering::Less);
    }
    if float == f64::NEG_INFINITY {
        return Some(Ordering::Greater);
    }
    let value = exact.to_bigint()?;
    let floor = BigInt::from_f64(float.floor())?;
    match value.cmp(&floor) {
        Ordering::Equal if float.fract() != 0.0 => Some(Ordering::Less),
        Ordering::Equal => Some(Ordering::Equal),
        ordering => Some(ordering),
    }
}

impl fmt::Display for JsonNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::BigInteger(b) => write!(f, "{}", b),
            Self::Float(v) => write!(f, "{:?}", v),
        }
    }
}

/// Deep JSON equality where numbers compare by value (`1 == 1.0`)
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            match (JsonNumber::from_json(x), JsonNumber::from_json(y)) {
                (Some(x), Some(y)) => x.compare(&y) == Some(Ordering::Equal),
                _ => false,
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, a)| y.get(key).is_some_and(|b| values_equal(a, b)))
        }
        _ => a == b,
    }
}
