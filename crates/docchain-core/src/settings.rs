//! Typed readers over a stage's flat settings mapping.
//!
//! Every reader produces the same [`SettingsError`] wording so configuration
//! problems read uniformly regardless of the stage that reports them.

use crate::document::{trim_to_null, Map, Value};
use crate::error::{Result, SettingsError};

/// Settings of one named stage.
#[derive(Debug, Clone, Copy)]
pub struct StageSettings<'a> {
    stage: &'a str,
    values: &'a Map<String, Value>,
}

impl<'a> StageSettings<'a> {
    pub fn new(stage: &'a str, values: &'a Map<String, Value>) -> Self {
        Self { stage, values }
    }

    /// Build settings from an optional mapping, failing when it is absent.
    pub fn required(stage: &'a str, values: Option<&'a Map<String, Value>>) -> Result<Self> {
        values
            .map(|values| Self::new(stage, values))
            .ok_or_else(|| SettingsError::MissingSection {
                stage: stage.to_string(),
            })
    }

    pub fn stage(&self) -> &'a str {
        self.stage
    }

    pub fn values(&self) -> &'a Map<String, Value> {
        self.values
    }

    pub fn raw(&self, field: &str) -> Option<&'a Value> {
        self.values.get(field).filter(|v| !v.is_null())
    }

    pub fn missing(&self, field: &str) -> SettingsError {
        SettingsError::missing(self.stage, field)
    }

    pub fn invalid(&self, field: &str, reason: impl Into<String>) -> SettingsError {
        SettingsError::invalid(self.stage, field, reason)
    }

    /// Optional string value, trimmed; blank counts as absent. Numbers and
    /// booleans are accepted in their string form.
    pub fn optional_str(&self, field: &str) -> Result<Option<String>> {
        match self.raw(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(trim_to_null(s).map(str::to_string)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(_) => Err(self.invalid(field, "must be a string")),
        }
    }

    pub fn required_str(&self, field: &str) -> Result<String> {
        self.optional_str(field)?.ok_or_else(|| self.missing(field))
    }

    /// Optional integer; numeric strings are accepted.
    pub fn optional_int(&self, field: &str) -> Result<Option<i64>> {
        match self.raw(field) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| self.invalid(field, "must be an integer")),
            Some(Value::String(s)) => match trim_to_null(s) {
                None => Ok(None),
                Some(s) => s
                    .parse::<i64>()
                    .map(Some)
                    .map_err(|_| self.invalid(field, "must be an integer")),
            },
            Some(_) => Err(self.invalid(field, "must be an integer")),
        }
    }

    pub fn required_int(&self, field: &str) -> Result<i64> {
        self.optional_int(field)?.ok_or_else(|| self.missing(field))
    }

    /// Optional boolean; `"true"` / `"false"` strings are accepted.
    pub fn optional_bool(&self, field: &str, default: bool) -> Result<bool> {
        match self.raw(field) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "" => Ok(default),
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(self.invalid(field, "must be a boolean")),
            },
            Some(_) => Err(self.invalid(field, "must be a boolean")),
        }
    }

    /// A list of non-blank strings. A single string is accepted as a one
    /// element list. Returns `None` when the field is absent or holds no
    /// usable entry.
    pub fn string_list(&self, field: &str) -> Result<Option<Vec<String>>> {
        let list = match self.raw(field) {
            None => return Ok(None),
            Some(Value::String(s)) => trim_to_null(s).map(|s| vec![s.to_string()]),
            Some(Value::Array(items)) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => {
                            if let Some(s) = trim_to_null(s) {
                                list.push(s.to_string());
                            }
                        }
                        Value::Null => {}
                        _ => return Err(self.invalid(field, "must be a list of strings")),
                    }
                }
                Some(list)
            }
            Some(_) => return Err(self.invalid(field, "must be a list of strings")),
        };
        Ok(list.filter(|l| !l.is_empty()))
    }

    pub fn required_string_list(&self, field: &str) -> Result<Vec<String>> {
        self.string_list(field)?.ok_or_else(|| self.missing(field))
    }

    /// Nested mapping value.
    pub fn object(&self, field: &str) -> Result<Option<&'a Map<String, Value>>> {
        match self.raw(field) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(self.invalid(field, "must be an object")),
        }
    }

    /// Settings for a nested entry, reported under the same stage name.
    pub fn nested(&self, values: &'a Map<String, Value>) -> StageSettings<'a> {
        StageSettings::new(self.stage, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("settings must be an object"),
        }
    }

    #[test]
    fn test_required_section() {
        assert!(matches!(
            StageSettings::required("stage", None),
            Err(SettingsError::MissingSection { .. })
        ));
    }

    #[test]
    fn test_strings() {
        let values = settings(json!({"a": " x ", "b": "  ", "c": 5, "d": [1]}));
        let s = StageSettings::new("stage", &values);
        assert_eq!(s.required_str("a").unwrap(), "x");
        assert!(matches!(s.required_str("b"), Err(SettingsError::Missing { .. })));
        assert_eq!(s.optional_str("c").unwrap(), Some("5".to_string()));
        assert!(matches!(s.optional_str("d"), Err(SettingsError::Invalid { .. })));
        assert_eq!(s.optional_str("missing").unwrap(), None);
    }

    #[test]
    fn test_integers() {
        let values = settings(json!({"a": 10, "b": "20", "c": "x", "d": 1.5}));
        let s = StageSettings::new("stage", &values);
        assert_eq!(s.required_int("a").unwrap(), 10);
        assert_eq!(s.required_int("b").unwrap(), 20);
        assert!(matches!(s.required_int("c"), Err(SettingsError::Invalid { .. })));
        assert!(matches!(s.required_int("d"), Err(SettingsError::Invalid { .. })));
        assert!(matches!(s.required_int("e"), Err(SettingsError::Missing { .. })));
    }

    #[test]
    fn test_booleans() {
        let values = settings(json!({"a": true, "b": "true", "c": "nope"}));
        let s = StageSettings::new("stage", &values);
        assert!(s.optional_bool("a", false).unwrap());
        assert!(s.optional_bool("b", false).unwrap());
        assert!(s.optional_bool("missing", true).unwrap());
        assert!(s.optional_bool("c", false).is_err());
    }

    #[test]
    fn test_string_lists() {
        let values = settings(json!({
            "list": ["a", " ", "b", null],
            "single": "c",
            "empty": [],
            "bad": [1]
        }));
        let s = StageSettings::new("stage", &values);
        assert_eq!(s.string_list("list").unwrap(), Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(s.string_list("single").unwrap(), Some(vec!["c".to_string()]));
        assert_eq!(s.string_list("empty").unwrap(), None);
        assert!(s.string_list("bad").is_err());
        assert!(matches!(
            s.required_string_list("empty"),
            Err(SettingsError::Missing { .. })
        ));
    }
}
