//! The uniform document type produced by every template.

use crate::registry::TemplateError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A generated document: a JSON object with a top-level string `id`.
///
/// Templates build arbitrary nested JSON; the pipeline only ever looks at the
/// `id` and the serialized length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Wrap a JSON value, checking that it is an object with a string `id`.
    pub fn from_value(value: Value) -> Result<Self, TemplateError> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(TemplateError::NotAnObject {
                    found: value_kind(&other),
                })
            }
        };
        match map.get("id") {
            Some(Value::String(_)) => Ok(Self(map)),
            _ => Err(TemplateError::MissingId),
        }
    }

    /// The document identifier.
    pub fn id(&self) -> &str {
        self.0.get("id").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert or replace a top-level field. Replacing `id` with a non-string
    /// is ignored so the identifier invariant always holds.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if key == "id" && !value.is_string() {
            return;
        }
        self.0.insert(key, value);
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Number of top-level fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
