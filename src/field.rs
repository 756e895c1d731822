//! Strongly typed context fields.
//!
//! Fields are attached to a single record, to a child logger through
//! [`Logger::with`](crate::Logger::with), or to every record through preset
//! fields in the configuration.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

/// The value carried by a [`Field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Any JSON-representable value.
    Json(Value),
    /// A duration, rendered according to the encoder's duration encoding.
    Duration(Duration),
    /// Opens a nested object; later fields of the same call land inside it.
    Namespace,
}

/// A key paired with a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: Cow<'static, str>,
    pub value: FieldValue,
}

impl Field {
    fn json(key: impl Into<Cow<'static, str>>, value: Value) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Json(value),
        }
    }

    pub fn string(key: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        Self::json(key, Value::String(value.into()))
    }

    pub fn int(key: impl Into<Cow<'static, str>>, value: i64) -> Self {
        Self::json(key, Value::from(value))
    }

    pub fn uint(key: impl Into<Cow<'static, str>>, value: u64) -> Self {
        Self::json(key, Value::from(value))
    }

    /// Non-finite floats are recorded as their string form.
    pub fn float(key: impl Into<Cow<'static, str>>, value: f64) -> Self {
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        Self::json(key, value)
    }

    pub fn bool(key: impl Into<Cow<'static, str>>, value: bool) -> Self {
        Self::json(key, Value::Bool(value))
    }

    pub fn duration(key: impl Into<Cow<'static, str>>, value: Duration) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Duration(value),
        }
    }

    /// Record a value through its `Display` implementation.
    pub fn display(key: impl Into<Cow<'static, str>>, value: impl fmt::Display) -> Self {
        Self::json(key, Value::String(value.to_string()))
    }

    /// Record any serializable value.
    ///
    /// If serialization fails the error text is recorded under `<key>Error`
    /// instead, so a bad value never drops the whole record.
    pub fn any<T: Serialize + ?Sized>(key: impl Into<Cow<'static, str>>, value: &T) -> Self {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => Self::json(key, value),
            Err(e) => Self::json(format!("{}Error", key), Value::String(e.to_string())),
        }
    }

    /// Nest every following field of the same call under `key`.
    pub fn namespace(key: impl Into<Cow<'static, str>>) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Namespace,
        }
    }

    /// Build a field from a loose key/value pair, as used by the sugared API.
    pub fn from_pair(key: &str, value: &Value) -> Self {
        Self::json(key.to_string(), value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_constructors() {
        assert_eq!(
            Field::string("name", "zhangsan").value,
            FieldValue::Json(Value::from("zhangsan"))
        );
        assert_eq!(Field::int("age", 18).value, FieldValue::Json(Value::from(18)));
        assert_eq!(Field::bool("ok", true).value, FieldValue::Json(Value::Bool(true)));
        assert_eq!(Field::display("n", 42u8).value, FieldValue::Json(Value::from("42")));
    }

    #[test]
    fn test_float_non_finite_becomes_string() {
        assert_eq!(
            Field::float("x", f64::NAN).value,
            FieldValue::Json(Value::from("NaN"))
        );
        assert_eq!(Field::float("x", 1.5).value, FieldValue::Json(Value::from(1.5)));
    }

    #[test]
    fn test_any_serializes_structures() {
        let mut map = HashMap::new();
        map.insert("a", 1);
        let field = Field::any("map", &map);
        assert_eq!(field.key, "map");
        assert_eq!(field.value, FieldValue::Json(serde_json::json!({"a": 1})));
    }

    #[test]
    fn test_any_records_serialization_error() {
        // Maps with non-string keys cannot become JSON objects.
        let mut map = HashMap::new();
        map.insert(vec![1u8], 1);
        let field = Field::any("bad", &map);
        assert_eq!(field.key, "badError");
        assert!(matches!(field.value, FieldValue::Json(Value::String(_))));
    }

    #[test]
    fn test_namespace_marker() {
        let field = Field::namespace("user1");
        assert_eq!(field.key, "user1");
        assert_eq!(field.value, FieldValue::Namespace);
    }
}
