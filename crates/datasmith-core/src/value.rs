use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// Type tag for generated values.
///
/// Every property declares exactly one kind; argument access is checked
/// against it at generation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Text,
    Uuid,
    Date,
    Timestamp,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Uuid => "uuid",
            ValueKind::Date => "date",
            ValueKind::Timestamp => "timestamp",
        }
    }

    /// Resolve a kind from its plan spelling.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "bool" | "boolean" => Some(ValueKind::Bool),
            "int" | "integer" => Some(ValueKind::Int),
            "float" | "double" => Some(ValueKind::Float),
            "text" | "string" => Some(ValueKind::Text),
            "uuid" => Some(ValueKind::Uuid),
            "date" => Some(ValueKind::Date),
            "timestamp" => Some(ValueKind::Timestamp),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated value for one property in one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Kind of this value; `None` for null.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Int(_) => Some(ValueKind::Int),
            Value::Float(_) => Some(ValueKind::Float),
            Value::Text(_) => Some(ValueKind::Text),
            Value::Uuid(_) => Some(ValueKind::Uuid),
            Value::Date(_) => Some(ValueKind::Date),
            Value::Timestamp(_) => Some(ValueKind::Timestamp),
        }
    }

    /// Default value of a kind, used when a row has no entry yet.
    pub fn default_for(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Int => Value::Int(0),
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Text => Value::Text(String::new()),
            ValueKind::Uuid => Value::Uuid(String::new()),
            ValueKind::Date => Value::Date(NaiveDate::default()),
            ValueKind::Timestamp => Value::Timestamp(NaiveDateTime::default()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) | Value::Uuid(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(value) => Some(*value),
            Value::Timestamp(value) => Some(value.date()),
            _ => None,
        }
    }

    /// Canonical string encoding, stable across runs.
    ///
    /// Used as the default provider value id and for exclusion bookkeeping.
    pub fn key(&self) -> String {
        match self {
            Value::Null => "<null>".to_string(),
            Value::Bool(value) => value.to_string(),
            Value::Int(value) => value.to_string(),
            Value::Float(value) => value.to_string(),
            Value::Text(value) | Value::Uuid(value) => value.clone(),
            Value::Date(value) => value.format(DATE_FORMAT).to_string(),
            Value::Timestamp(value) => value.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Inverse of [`Value::key`] for a known kind.
    pub fn parse_key(kind: ValueKind, key: &str) -> Option<Self> {
        match kind {
            ValueKind::Bool => key.parse::<bool>().ok().map(Value::Bool),
            ValueKind::Int => key.parse::<i64>().ok().map(Value::Int),
            ValueKind::Float => key.parse::<f64>().ok().map(Value::Float),
            ValueKind::Text => Some(Value::Text(key.to_string())),
            ValueKind::Uuid => Some(Value::Uuid(key.to_string())),
            ValueKind::Date => NaiveDate::parse_from_str(key, DATE_FORMAT)
                .ok()
                .map(Value::Date),
            ValueKind::Timestamp => NaiveDateTime::parse_from_str(key, TIMESTAMP_FORMAT)
                .ok()
                .map(Value::Timestamp),
        }
    }

    /// Convert a plan-level JSON literal into a typed value.
    ///
    /// Integers are accepted for float kinds; everything else must match
    /// the declared kind exactly.
    pub fn from_json(kind: ValueKind, raw: &serde_json::Value) -> Option<Self> {
        match (kind, raw) {
            (_, serde_json::Value::Null) => Some(Value::Null),
            (ValueKind::Bool, serde_json::Value::Bool(value)) => Some(Value::Bool(*value)),
            (ValueKind::Int, serde_json::Value::Number(value)) => value.as_i64().map(Value::Int),
            (ValueKind::Float, serde_json::Value::Number(value)) => {
                value.as_f64().map(Value::Float)
            }
            (ValueKind::Text, serde_json::Value::String(value)) => {
                Some(Value::Text(value.clone()))
            }
            (ValueKind::Uuid, serde_json::Value::String(value)) => {
                Some(Value::Uuid(value.clone()))
            }
            (ValueKind::Date | ValueKind::Timestamp, serde_json::Value::String(value)) => {
                Value::parse_key(kind, value)
            }
            _ => None,
        }
    }

    pub fn to_csv(&self) -> String {
        match self {
            Value::Null => String::new(),
            other => other.key(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(value) => serde_json::Value::Bool(*value),
            Value::Int(value) => serde_json::Value::from(*value),
            Value::Float(value) => serde_json::Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(value) | Value::Uuid(value) => serde_json::Value::String(value.clone()),
            Value::Date(value) => serde_json::Value::String(value.format(DATE_FORMAT).to_string()),
            Value::Timestamp(value) => {
                serde_json::Value::String(value.format(TIMESTAMP_FORMAT).to_string())
            }
        }
    }

    /// Total-order comparison between two values of the same kind.
    ///
    /// `None` when the kinds differ or either side is null.
    pub fn cmp_same_kind(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Half-open interval membership check: `min <= self < max`.
    pub fn in_range(&self, min: &Value, max: &Value) -> bool {
        let lower = matches!(
            self.cmp_same_kind(min),
            Some(Ordering::Greater | Ordering::Equal)
        );
        let upper = matches!(self.cmp_same_kind(max), Some(Ordering::Less));
        lower && upper
    }
}
