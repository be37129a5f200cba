use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Boolean(bool),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    /// A list-valued attribute, e.g. an already split `GROUP_CONCAT` column.
    StringArray(Vec<String>),
    Null,
}

impl Value {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(v) => u64::try_from(*v).ok(),
            Value::Uint(v) => Some(*v),
            Value::Float(v) if *v >= 0.0 => Some(*v as u64),
            Value::String(v) => v.trim().parse::<u64>().ok(),
            Value::Json(v) => v.as_u64(),
            _ => None,
        }
    }

    /// The textual form of a scalar value, unquoted.
    ///
    /// Used wherever values are compared the way a loosely typed row would
    /// compare them, e.g. `1` and `"1"` are the same id.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Int(v) => Some(v.to_string()),
            Value::Uint(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::String(v) => Some(v.clone()),
            Value::Boolean(v) => Some(v.to_string()),
            Value::Json(v) => v.as_str().map(|s| s.to_string()),
            Value::Date(v) => Some(v.to_string()),
            Value::Timestamp(v) => Some(v.to_rfc3339()),
            Value::Bytes(v) => String::from_utf8(v.clone()).ok(),
            Value::StringArray(_) => None,
            Value::Null => None,
        }
    }

    /// Mirrors the "empty" notion of a loosely typed row: null, empty
    /// strings, `"0"`, zero, `false` and empty lists are all empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty() || s == "0",
            Value::Int(v) => *v == 0,
            Value::Uint(v) => *v == 0,
            Value::Float(v) => *v == 0.0,
            Value::Boolean(b) => !b,
            Value::Bytes(b) => b.is_empty(),
            Value::StringArray(v) => v.is_empty(),
            Value::Json(v) => v.is_null(),
            Value::Date(_) | Value::Timestamp(_) => false,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Option<Value>,
}

impl FieldValue {
    pub fn new(name: &str, value: Value) -> Self {
        FieldValue {
            name: name.to_string(),
            value: Some(value),
        }
    }
}
