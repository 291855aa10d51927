//! Maps scalar values through a lookup table.

use std::collections::HashMap;

use docchain_core::path;
use docchain_core::{
    value_to_string, ChainContext, Document, Result as SettingsResult, StageSettings, Value,
};

use super::{CFG_SOURCE_FIELD, CFG_TARGET_FIELD};
use crate::fanout::FanOutRunner;
use crate::preprocessor::{data_warning, write_failed, Preprocessor};
use crate::Result;

pub const CFG_VALUE_MAPPING: &str = "value_mapping";
pub const CFG_VALUE_DEFAULT: &str = "value_default";

/// Default meaning "keep the source value".
pub const DEFAULT_ORIGINAL: &str = "{original}";

#[derive(Debug, Clone, PartialEq)]
enum Fallback {
    None,
    Original,
    Value(Value),
}

#[derive(Debug, Clone)]
pub struct ValueMapperStage {
    name: String,
    source_field: String,
    target_field: String,
    mapping: HashMap<String, Value>,
    fallback: Fallback,
    runner: FanOutRunner,
}

impl ValueMapperStage {
    pub fn from_settings(settings: &StageSettings<'_>) -> SettingsResult<Self> {
        let mapping = settings
            .object(CFG_VALUE_MAPPING)?
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        let fallback = match settings.optional_str(CFG_VALUE_DEFAULT)? {
            None => Fallback::None,
            Some(d) if d == DEFAULT_ORIGINAL => Fallback::Original,
            Some(d) => Fallback::Value(Value::String(d)),
        };

        Ok(Self {
            name: settings.stage().to_string(),
            source_field: settings.required_str(CFG_SOURCE_FIELD)?,
            target_field: settings.required_str(CFG_TARGET_FIELD)?,
            mapping,
            fallback,
            runner: FanOutRunner::from_settings(settings)?,
        })
    }

    /// Value to write for a scalar or absent source, if any.
    fn mapped_value(&self, source: Option<&Value>) -> Option<Value> {
        let Some(source) = source.filter(|v| !v.is_null()) else {
            return match &self.fallback {
                Fallback::Value(v) => Some(v.clone()),
                _ => None,
            };
        };

        let mapped = value_to_string(source).and_then(|key| self.mapping.get(&key)).cloned();
        match (mapped, &self.fallback) {
            (Some(mapped), _) => Some(mapped),
            (None, Fallback::Original) => value_to_string(source).map(Value::String),
            (None, Fallback::Value(v)) => Some(v.clone()),
            (None, Fallback::None) => None,
        }
    }

    fn map(&self, document: &mut Document, base: Option<&str>, context: &mut ChainContext) {
        let value = match path::extract(document, &self.source_field).as_deref() {
            Some(v) if v.is_array() || v.is_object() => {
                data_warning(
                    context,
                    &self.name,
                    format!(
                        "Value for field '{}' is a collection, so can't be mapped",
                        path::full_field_name(base, &self.source_field)
                    ),
                );
                return;
            }
            source => self.mapped_value(source),
        };

        if let Some(value) = value {
            if let Err(e) = path::put(document, &self.target_field, value) {
                write_failed(context, &self.name, e);
            }
        }
    }
}

impl Preprocessor for ValueMapperStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, document: &mut Document, context: &mut ChainContext) -> Result<()> {
        self.runner
            .run(document, || (), |sub, _, base, chain| self.map(sub, base, chain), context);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::doc;
    use serde_json::json;

    fn stage(default: Value) -> ValueMapperStage {
        let values = doc(json!({
            "source_field": "status",
            "target_field": "status_label",
            "value_mapping": {"1": "Open", "2": "Closed"},
            "value_default": default
        }));
        ValueMapperStage::from_settings(&StageSettings::new("status", &values)).unwrap()
    }

    fn run(stage: &ValueMapperStage, d: Value) -> (Document, ChainContext) {
        let mut d = doc(d);
        let mut ctx = ChainContext::new();
        stage.process(&mut d, &mut ctx).unwrap();
        (d, ctx)
    }

    #[test]
    fn test_maps_value() {
        let (d, _) = run(&stage(Value::Null), json!({"status": 2}));
        assert_eq!(d["status_label"], json!("Closed"));
        let (d, _) = run(&stage(Value::Null), json!({"status": "1"}));
        assert_eq!(d["status_label"], json!("Open"));
    }

    #[test]
    fn test_unmapped_value_without_default() {
        let (d, ctx) = run(&stage(Value::Null), json!({"status": 3}));
        assert!(!d.contains_key("status_label"));
        assert!(!ctx.has_warnings());
    }

    #[test]
    fn test_plain_default() {
        let s = stage(json!("Unknown"));
        let (d, _) = run(&s, json!({"status": 3}));
        assert_eq!(d["status_label"], json!("Unknown"));
        let (d, _) = run(&s, json!({}));
        assert_eq!(d["status_label"], json!("Unknown"));
    }

    #[test]
    fn test_original_default() {
        let s = stage(json!("{original}"));
        let (d, _) = run(&s, json!({"status": 3}));
        assert_eq!(d["status_label"], json!("3"));
        let (d, _) = run(&s, json!({"status": true}));
        assert_eq!(d["status_label"], json!("true"));
        let (d, _) = run(&s, json!({"other": 1}));
        assert!(!d.contains_key("status_label"));
    }

    #[test]
    fn test_collection_source_warns() {
        let (d, ctx) = run(&stage(json!("Unknown")), json!({"status": [1, 2]}));
        assert!(!d.contains_key("status_label"));
        assert_eq!(ctx.warnings().len(), 1);
        assert!(ctx.warnings()[0].message.contains("'status'"));
    }

    #[test]
    fn test_collection_warning_names_base() {
        let values = doc(json!({
            "source_field": "status",
            "target_field": "status_label",
            "value_mapping": {"1": "Open"},
            "source_bases": ["tickets"]
        }));
        let s = ValueMapperStage::from_settings(&StageSettings::new("status", &values)).unwrap();
        let (d, ctx) = run(&s, json!({"tickets": [{"status": 1}, {"status": [1]}]}));
        assert_eq!(d["tickets"][0]["status_label"], json!("Open"));
        assert_eq!(ctx.warnings().len(), 1);
        assert!(ctx.warnings()[0].message.contains("'tickets.status'"));
    }
}
