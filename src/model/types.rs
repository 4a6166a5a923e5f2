//! Semantic types, cell values and join keys.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Text formats accepted when a text column is declared as a datetime.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Semantic type tag carried by every column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Numeric,
    Categorical,
    Boolean,
    Datetime,
}

impl SemanticType {
    pub const ALL: [SemanticType; 4] = [
        SemanticType::Numeric,
        SemanticType::Categorical,
        SemanticType::Boolean,
        SemanticType::Datetime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Numeric => "numeric",
            SemanticType::Categorical => "categorical",
            SemanticType::Boolean => "boolean",
            SemanticType::Datetime => "datetime",
        }
    }

    /// Infer the type of a single non-null value.
    pub fn of_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(_) => Some(SemanticType::Numeric),
            Value::Boolean(_) => Some(SemanticType::Boolean),
            Value::Text(_) => Some(SemanticType::Categorical),
            Value::Datetime(_) => Some(SemanticType::Datetime),
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single cell. `Null` is the missing-value marker.
///
/// Serialized externally tagged (`{"number": 2.0}`, `"null"`), so text that
/// looks like a date stays text after a round trip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    #[default]
    Null,
    Number(f64),
    Boolean(bool),
    Datetime(NaiveDateTime),
    Text(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Midnight of the given calendar date; `Null` for an invalid date.
    pub fn date(year: i32, month: u32, day: u32) -> Self {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(Value::Datetime)
            .unwrap_or(Value::Null)
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

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Datetime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Truthiness used by `percent_true` on boolean and categorical values.
    pub fn truthiness(&self) -> Option<bool> {
        match self {
            Value::Null => None,
            Value::Boolean(b) => Some(*b),
            Value::Number(n) => Some(*n != 0.0),
            Value::Text(s) => Some(matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "t" | "yes" | "y" | "1"
            )),
            Value::Datetime(_) => None,
        }
    }

    /// Coerce this value into the given semantic type.
    ///
    /// Returns `None` when the value cannot represent that type. Numbers and
    /// booleans may be declared categorical; text may be declared datetime
    /// when it parses.
    pub fn coerce(&self, ty: SemanticType) -> Option<Value> {
        match (self, ty) {
            (Value::Null, _) => Some(Value::Null),
            (Value::Number(_), SemanticType::Numeric)
            | (Value::Boolean(_), SemanticType::Boolean)
            | (Value::Datetime(_), SemanticType::Datetime)
            | (Value::Text(_), SemanticType::Categorical)
            | (Value::Number(_), SemanticType::Categorical)
            | (Value::Boolean(_), SemanticType::Categorical) => Some(self.clone()),
            (Value::Boolean(b), SemanticType::Numeric) => {
                Some(Value::Number(if *b { 1.0 } else { 0.0 }))
            }
            (Value::Text(s), SemanticType::Datetime) => parse_datetime(s).map(Value::Datetime),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Datetime(dt) => write!(f, "{}", dt),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Datetime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Parse a datetime from one of the accepted text formats.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Hashable form of an index or relationship key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Integer(i64),
    Text(String),
}

impl Key {
    /// Convert a cell into a key. Only integral numbers and text qualify.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(Key::Integer(*n as i64)),
            Value::Text(s) => Some(Key::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Integer(i) => write!(f, "{}", i),
            Key::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Integer(v)
    }
}

impl From<i32> for Key {
    fn from(v: i32) -> Self {
        Key::Integer(v as i64)
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Text(v.to_string())
    }
}
