//! Adds several values, rendering string values that contain placeholders.

use docchain_core::path;
use docchain_core::{
    ChainContext, Document, Result as SettingsResult, SettingsError, StageSettings, Template, Value,
};

use crate::preprocessor::{write_failed, Preprocessor};
use crate::Result;

#[derive(Debug, Clone)]
enum FieldValue {
    Constant(Value),
    Template(Template),
}

#[derive(Debug, Clone)]
pub struct AddMultipleValuesStage {
    name: String,
    fields: Vec<(String, FieldValue)>,
}

impl AddMultipleValuesStage {
    /// Every settings entry is a `path -> value` pair.
    pub fn from_settings(settings: &StageSettings<'_>) -> SettingsResult<Self> {
        if settings.values().is_empty() {
            return Err(SettingsError::MissingSection {
                stage: settings.stage().to_string(),
            });
        }

        let fields = settings
            .values()
            .iter()
            .map(|(field, value)| {
                let value = match value {
                    Value::String(s) if Template::new(s.as_str()).has_placeholders() => {
                        FieldValue::Template(Template::new(s.as_str()))
                    }
                    other => FieldValue::Constant(other.clone()),
                };
                (field.clone(), value)
            })
            .collect();

        Ok(Self {
            name: settings.stage().to_string(),
            fields,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(field, _)| field.as_str())
    }
}

impl Preprocessor for AddMultipleValuesStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, document: &mut Document, context: &mut ChainContext) -> Result<()> {
        for (field, value) in &self.fields {
            let value = match value {
                FieldValue::Constant(v) => v.clone(),
                FieldValue::Template(t) => Value::String(t.render(Some(document), None, None)),
            };
            if let Err(e) = path::put(document, field, value) {
                write_failed(context, &self.name, e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::doc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_adds_constants_and_templates() {
        let values = doc(json!({
            "source": "feed",
            "display": "{author.name} <{author.email}>",
            "tags": ["a", "b"],
            "meta.count": 3
        }));
        let stage = AddMultipleValuesStage::from_settings(&StageSettings::new("defaults", &values)).unwrap();

        let mut d = doc(json!({"author": {"name": "Ana", "email": "ana@example.org"}}));
        let mut ctx = ChainContext::new();
        stage.process(&mut d, &mut ctx).unwrap();

        assert_eq!(
            serde_json::Value::Object(d),
            json!({
                "author": {"name": "Ana", "email": "ana@example.org"},
                "source": "feed",
                "display": "Ana <ana@example.org>",
                "tags": ["a", "b"],
                "meta": {"count": 3}
            })
        );
        assert!(!ctx.has_warnings());
    }

    #[test]
    fn test_empty_settings() {
        let values = Document::new();
        assert!(matches!(
            AddMultipleValuesStage::from_settings(&StageSettings::new("s", &values)),
            Err(SettingsError::MissingSection { .. })
        ));
    }
}
