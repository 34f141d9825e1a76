// src/data/value.rs
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// Date formats recognized when typing a raw cell.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y"];

/// Raw cell spellings that mean "no value".
const NULL_MARKERS: &[&str] = &["na", "n/a", "nan", "null", "none"];

/// A typed scalar cell.
///
/// Values are totally ordered so they can be kept in ordered sets:
/// nulls sort first, then numbers, dates and strings. Numbers compare with
/// IEEE total ordering, which keeps `Eq` and `Ord` consistent.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Number(f64),
    Date(NaiveDate),
    String(String),
}

impl Value {
    /// Type a raw text cell.
    ///
    /// Empty cells and the usual null markers become [`Value::Null`]; finite
    /// numbers become [`Value::Number`]; `2024-03-31` and `31-Mar-2024`
    /// become [`Value::Date`]. Everything else is kept as a trimmed string.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || NULL_MARKERS
                .iter()
                .any(|marker| trimmed.eq_ignore_ascii_case(marker))
        {
            return Value::Null;
        }

        if let Ok(number) = trimmed.parse::<f64>() {
            if number.is_finite() {
                return Value::Number(number);
            }
        }

        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                return Value::Date(date);
            }
        }

        Value::String(trimmed.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Number(_) => 1,
            Value::Date(_) => 2,
            Value::String(_) => 3,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Number(n) => n.to_bits().hash(state),
            Value::Date(d) => d.hash(state),
            Value::String(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{:.0}", n),
            Value::Number(n) => write!(f, "{}", n),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
            Value::String(s) => serializer.serialize_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
