//! Context values: the typed inputs a decision table is evaluated against
//!
//! A context is a flat mapping from field name to [`Value`]. A field that is
//! not in the mapping and a field present as [`Value::Absent`] are distinct
//! states, but neither can satisfy a non-empty condition.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single context value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, from = "serde_json::Value")]
pub enum Value {
    Boolean(bool),
    Number(f64),
    Text(String),
    Absent,
}

impl Value {
    /// True for [`Value::Absent`] and for text that is blank after trimming.
    ///
    /// Diagnostics treat both as "not supplied yet".
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Absent => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// String form used when a value has to be compared as text
    pub fn to_text(&self) -> String {
        match self {
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Absent => String::new(),
        }
    }
}

/// Render a number the way table authors write it: `1` rather than `1.0`
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    n.to_string()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "null"),
            other => write!(f, "{}", other.to_text()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Absent,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => Value::Number(f),
                None => Value::Text(n.to_string()),
            },
            serde_json::Value::String(s) => Value::Text(s),
            // Lists and objects have no condition syntax; compare them by their JSON text.
            other => Value::Text(other.to_string()),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Absent => serde_json::Value::Null,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
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

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Evaluation context: field name → value, iterated in field-name order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    fields: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON object
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Object(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect()),
            other => Err(Error::Other(format!(
                "Context must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Parse a context from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json(serde_json::from_str(json)?)
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Field is not in the mapping, is [`Value::Absent`], or is blank text
    pub fn is_missing(&self, field: &str) -> bool {
        self.fields.get(field).is_none_or(Value::is_missing)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_object() {
        let ctx = Context::from_json(json!({
            "floors": 1,
            "area": 80.5,
            "usage": "office",
            "sprinklered": true,
            "note": null,
            "tags": ["a", "b"]
        }))
        .unwrap();

        assert_eq!(ctx.get("floors"), Some(&Value::Number(1.0)));
        assert_eq!(ctx.get("area"), Some(&Value::Number(80.5)));
        assert_eq!(ctx.get("usage"), Some(&Value::Text("office".into())));
        assert_eq!(ctx.get("sprinklered"), Some(&Value::Boolean(true)));
        assert_eq!(ctx.get("note"), Some(&Value::Absent));
        assert_eq!(ctx.get("tags"), Some(&Value::Text("[\"a\",\"b\"]".into())));
    }

    #[test]
    fn test_iteration_is_sorted_by_field() {
        let ctx = Context::from_json_str(r#"{"usage": "office", "area": 80, "floors": 1}"#).unwrap();
        let fields: Vec<_> = ctx.fields().collect();
        assert_eq!(fields, vec!["area", "floors", "usage"]);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = Context::from_json(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_missing_vs_absent() {
        let ctx = Context::new()
            .with("present", "x")
            .with("blank", "  ")
            .with("null", Value::Absent);

        assert!(!ctx.is_missing("present"));
        assert!(ctx.is_missing("blank"));
        assert!(ctx.is_missing("null"));
        assert!(ctx.is_missing("nowhere"));
        assert!(ctx.contains("null"));
        assert!(!ctx.contains("nowhere"));
    }

    #[test]
    fn test_number_text_form() {
        assert_eq!(Value::Number(1.0).to_text(), "1");
        assert_eq!(Value::Number(1.1).to_text(), "1.1");
        assert_eq!(Value::Number(-0.0).to_text(), "0");
        assert_eq!(Value::Boolean(false).to_text(), "false");
    }

    #[test]
    fn test_deserialize_context() {
        let ctx: Context = serde_json::from_str(r#"{"a": 1, "b": "x", "c": null}"#).unwrap();
        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.get("c"), Some(&Value::Absent));
    }
}
