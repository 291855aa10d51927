//! Collects distinct values from several fields into one list.

use docchain_core::path;
use docchain_core::{
    ChainContext, CopyMode, Document, Result as SettingsResult, StageSettings, Value,
};

use super::CFG_TARGET_FIELD;
use crate::preprocessor::{write_failed, Preprocessor};
use crate::Result;

pub const CFG_SOURCE_FIELDS: &str = "source_fields";
pub const CFG_DEEP_COPY: &str = "deep_copy";

#[derive(Debug, Clone)]
pub struct ValuesCollectingStage {
    name: String,
    source_fields: Vec<String>,
    target_field: String,
    copy_mode: CopyMode,
}

impl ValuesCollectingStage {
    pub fn from_settings(settings: &StageSettings<'_>) -> SettingsResult<Self> {
        let copy_mode = if settings.optional_bool(CFG_DEEP_COPY, false)? {
            CopyMode::Deep
        } else {
            CopyMode::Reference
        };

        Ok(Self {
            name: settings.stage().to_string(),
            source_fields: settings.required_string_list(CFG_SOURCE_FIELDS)?,
            target_field: settings.required_str(CFG_TARGET_FIELD)?,
            copy_mode,
        })
    }

    fn collect(&self, document: &Document) -> Vec<Value> {
        let mut values: Vec<Value> = Vec::new();
        let mut push = |value: &Value| {
            if value.is_null() {
                return;
            }
            let value = self.copy_mode.copy(value);
            if !values.contains(&value) {
                values.push(value);
            }
        };

        for field in &self.source_fields {
            match path::extract(document, field).as_deref() {
                Some(Value::Array(items)) => items.iter().for_each(&mut push),
                Some(value) => push(value),
                None => {}
            }
        }
        values
    }
}

impl Preprocessor for ValuesCollectingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, document: &mut Document, context: &mut ChainContext) -> Result<()> {
        let values = self.collect(document);
        let value = if values.is_empty() {
            Value::Null
        } else {
            Value::Array(values)
        };

        if let Err(e) = path::put(document, &self.target_field, value) {
            write_failed(context, &self.name, e);
        }
        Ok(())
    }
}
