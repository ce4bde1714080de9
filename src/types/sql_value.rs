use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Represents a column or parameter value in a store-agnostic way.
/// Stores are responsible for converting these to their native types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(i) => Some(*i),
            SqlValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Int(i) => Some(*i as f64),
            SqlValue::Float(f) => Some(*f),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Compares two values the way a loosely typed store would.
    ///
    /// Numbers compare across integer and float, and text that parses as a
    /// number compares against numbers. NULL is incomparable with everything,
    /// including NULL.
    pub fn compare(&self, other: &SqlValue) -> Option<Ordering> {
        match (self, other) {
            (SqlValue::Null, _) | (_, SqlValue::Null) => None,
            (SqlValue::Bool(a), SqlValue::Bool(b)) => Some(a.cmp(b)),
            (SqlValue::Text(a), SqlValue::Text(b)) => Some(a.cmp(b)),
            (SqlValue::Int(a), SqlValue::Int(b)) => Some(a.cmp(b)),
            (SqlValue::Bool(b), SqlValue::Int(_)) | (SqlValue::Bool(b), SqlValue::Float(_)) => {
                SqlValue::Int(*b as i64).compare(other)
            }
            (SqlValue::Int(_), SqlValue::Bool(b)) | (SqlValue::Float(_), SqlValue::Bool(b)) => {
                self.compare(&SqlValue::Int(*b as i64))
            }
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value as i64)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<u32> for SqlValue {
    fn from(value: u32) -> Self {
        SqlValue::Int(value as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// Nested arrays and objects are kept as their JSON text.
impl From<serde_json::Value> for SqlValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => SqlValue::Null,
            serde_json::Value::Bool(b) => SqlValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Int(i),
                None => SqlValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => SqlValue::Text(s),
            other => SqlValue::Text(other.to_string()),
        }
    }
}

impl From<SqlValue> for serde_json::Value {
    fn from(value: SqlValue) -> Self {
        match value {
            SqlValue::Null => serde_json::Value::Null,
            SqlValue::Bool(b) => serde_json::Value::Bool(b),
            SqlValue::Int(i) => serde_json::Value::from(i),
            SqlValue::Float(f) => serde_json::Value::from(f),
            SqlValue::Text(s) => serde_json::Value::String(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_across_numeric_types() {
        assert_eq!(
            SqlValue::Int(7).compare(&SqlValue::Float(7.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            SqlValue::Text("7".into()).compare(&SqlValue::Int(8)),
            Some(Ordering::Less)
        );
        assert_eq!(SqlValue::Null.compare(&SqlValue::Null), None);
        assert_eq!(SqlValue::Text("abc".into()).compare(&SqlValue::Int(1)), None);
    }

    #[test]
    fn test_json_conversion() {
        let value: SqlValue = serde_json::json!(120.5).into();
        assert_eq!(value, SqlValue::Float(120.5));
        let value: SqlValue = serde_json::json!(3).into();
        assert_eq!(value, SqlValue::Int(3));
        let value: SqlValue = serde_json::json!({"a": 1}).into();
        assert_eq!(value, SqlValue::Text("{\"a\":1}".to_string()));
    }

    #[test]
    fn test_untagged_serialization() {
        let encoded = serde_json::to_string(&vec![
            SqlValue::Null,
            SqlValue::Bool(true),
            SqlValue::Int(1),
            SqlValue::Text("x".into()),
        ])
        .unwrap();
        assert_eq!(encoded, r#"[null,true,1,"x"]"#);
    }
}
