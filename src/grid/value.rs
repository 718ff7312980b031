use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single cell as the grid sees it, independent of the row type it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Null, or text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Numeric view used by filters, so `"2020"` and `2020` compare alike.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::Text(s) if looks_numeric(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Int(_) | CellValue::Float(_) => 2,
            CellValue::Text(_) => 3,
        }
    }

    /// Total order used for sorting: null < bool < number < text.
    ///
    /// Integers and floats compare numerically; floats use IEEE total order.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Int(a), CellValue::Int(b)) => a.cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            (CellValue::Int(a), CellValue::Float(b)) => int_float_cmp(*a, *b),
            (CellValue::Float(a), CellValue::Int(b)) => int_float_cmp(*b, *a).reverse(),
            (CellValue::Float(a), CellValue::Float(b)) => a.total_cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// Ordering for range filters: numeric when both sides read as numbers,
    /// otherwise by display text.
    pub fn filter_cmp(&self, other: &Self) -> Ordering {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }

    /// Exact match for column filters; numbers match numerically.
    pub fn filter_eq(&self, other: &Self) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }

    /// Parse a user-typed literal.
    ///
    /// Quoted values are text; unquoted values are tried as integer, float and
    /// boolean before falling back to text.
    pub fn parse_literal(input: &str) -> Self {
        let val = input.trim();

        if val.len() >= 2 && val.starts_with('\'') && val.ends_with('\'') {
            return CellValue::Text(val[1..val.len() - 1].to_string());
        }

        if let Ok(i) = val.parse::<i64>() {
            return CellValue::Int(i);
        }

        if looks_numeric(val) {
            if let Ok(f) = val.parse::<f64>() {
                return CellValue::Float(f);
            }
        }

        match val.to_lowercase().as_str() {
            "true" => CellValue::Bool(true),
            "false" => CellValue::Bool(false),
            "null" => CellValue::Null,
            _ => CellValue::Text(val.to_string()),
        }
    }
}

/// `i` against `f` without losing precision above 2^53.
fn int_float_cmp(i: i64, f: f64) -> Ordering {
    match (i as f64).total_cmp(&f) {
        // equal means f is integral with magnitude at most 2^63
        Ordering::Equal => i128::from(i).cmp(&(f as i128)),
        other => other,
    }
}

// Keeps words like "nan" or "inf" from parsing as floats.
fn looks_numeric(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl<V: Into<CellValue>> From<Option<V>> for CellValue {
    fn from(v: Option<V>) -> Self {
        v.map_or(CellValue::Null, Into::into)
    }
}
