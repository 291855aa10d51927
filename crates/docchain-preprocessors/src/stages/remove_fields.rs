//! Removes fields, optionally from every sub-document of the source bases.

use docchain_core::path;
use docchain_core::{ChainContext, Document, Result as SettingsResult, StageSettings};

use crate::fanout::FanOutRunner;
use crate::preprocessor::{write_failed, Preprocessor};
use crate::Result;

pub const CFG_FIELDS: &str = "fields";

#[derive(Debug, Clone)]
pub struct RemoveFieldsStage {
    name: String,
    fields: Vec<String>,
    runner: FanOutRunner,
}

impl RemoveFieldsStage {
    pub fn from_settings(settings: &StageSettings<'_>) -> SettingsResult<Self> {
        Ok(Self {
            name: settings.stage().to_string(),
            fields: settings.required_string_list(CFG_FIELDS)?,
            runner: FanOutRunner::from_settings(settings)?,
        })
    }

    fn remove(&self, document: &mut Document, context: &mut ChainContext) {
        for field in &self.fields {
            if let Err(e) = path::delete(document, field) {
                write_failed(context, &self.name, e);
            }
        }
    }
}

impl Preprocessor for RemoveFieldsStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, document: &mut Document, context: &mut ChainContext) -> Result<()> {
        self.runner
            .run(document, || (), |sub, _, _, chain| self.remove(sub, chain), context);
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
    fn test_removes_fields() {
        let values = doc(json!({"fields": ["internal", "meta.secret", "missing"]}));
        let stage = RemoveFieldsStage::from_settings(&StageSettings::new("cleanup", &values)).unwrap();

        let mut d = doc(json!({"internal": 1, "meta": {"secret": "x", "keep": true}, "title": "t"}));
        let mut ctx = ChainContext::new();
        stage.process(&mut d, &mut ctx).unwrap();

        assert_eq!(
            serde_json::Value::Object(d),
            json!({"meta": {"keep": true}, "title": "t"})
        );
    }

    #[test]
    fn test_single_field_over_bases() {
        let values = doc(json!({"fields": "email", "source_bases": ["author", "comments.author"]}));
        let stage = RemoveFieldsStage::from_settings(&StageSettings::new("strip email", &values)).unwrap();

        let mut d = doc(json!({
            "author": {"name": "Ana", "email": "a@x"},
            "comments": [{"author": {"name": "Bo", "email": "b@x"}}]
        }));
        let mut ctx = ChainContext::new();
        stage.process(&mut d, &mut ctx).unwrap();

        assert_eq!(d["author"], json!({"name": "Ana"}));
        assert_eq!(d["comments"][0]["author"], json!({"name": "Bo"}));
    }

    #[test]
    fn test_fields_required() {
        let values = doc(json!({"fields": []}));
        assert!(RemoveFieldsStage::from_settings(&StageSettings::new("s", &values)).is_err());
    }
}
