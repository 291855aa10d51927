//! Document value model
//!
//! A document is a string keyed mapping of JSON values. Stages only rely on
//! the mapping / sequence / scalar distinction, so the plain `serde_json`
//! types are used directly.

use serde::{Deserialize, Serialize};
pub use serde_json::{Map, Value};

/// A mutable, string keyed document tree.
pub type Document = Map<String, Value>;

/// Default string conversion for a value.
///
/// Returns `None` for `null`. Sequences and mappings are rendered as compact
/// JSON.
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Trim a string, returning `None` when nothing is left.
pub fn trim_to_null(src: &str) -> Option<&str> {
    let trimmed = src.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// `true` for `null` and for blank strings.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// How structured values are copied when one stage aggregates values from
/// several places of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyMode {
    /// Copy the value as it is.
    #[default]
    Reference,
    /// Rebuild every sequence and mapping, dropping `null` members.
    Deep,
}

impl CopyMode {
    pub fn copy(self, value: &Value) -> Value {
        match self {
            CopyMode::Reference => value.clone(),
            CopyMode::Deep => deep_copy(value),
        }
    }
}

fn deep_copy(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|item| !item.is_null())
                .map(deep_copy)
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), deep_copy(v)))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}
