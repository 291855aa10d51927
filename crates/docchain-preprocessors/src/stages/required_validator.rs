//! Rejects documents missing a required field.

use docchain_core::document::is_empty_value;
use docchain_core::path;
use docchain_core::{ChainContext, Document, Result as SettingsResult, StageSettings, Value};

use super::CFG_FIELD;
use crate::preprocessor::Preprocessor;
use crate::{ProcessError, Result};

#[derive(Debug, Clone)]
pub struct RequiredValidatorStage {
    name: String,
    field: String,
}

impl RequiredValidatorStage {
    pub fn new(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
        }
    }

    pub fn from_settings(settings: &StageSettings<'_>) -> SettingsResult<Self> {
        Ok(Self::new(settings.stage(), settings.required_str(CFG_FIELD)?))
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(Value::Array(items)) => items.is_empty(),
        Some(value) => is_empty_value(value),
    }
}

impl Preprocessor for RequiredValidatorStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, document: &mut Document, _context: &mut ChainContext) -> Result<()> {
        if is_missing(path::extract(document, &self.field).as_deref()) {
            return Err(ProcessError::InvalidData {
                stage: self.name.clone(),
                message: format!("Field '{}' is required", self.field),
            });
        }
        Ok(())
    }
}
