//! Adds one constant value to the document.

use docchain_core::path;
use docchain_core::{ChainContext, Document, Result as SettingsResult, StageSettings, Value};

use super::CFG_FIELD;
use crate::preprocessor::{write_failed, Preprocessor};
use crate::Result;

pub const CFG_VALUE: &str = "value";

#[derive(Debug, Clone)]
pub struct AddValueStage {
    name: String,
    field: String,
    value: Value,
}

impl AddValueStage {
    pub fn new(name: impl Into<String>, field: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            value,
        }
    }

    /// `value` may be anything, including null.
    pub fn from_settings(settings: &StageSettings<'_>) -> SettingsResult<Self> {
        let field = settings.required_str(CFG_FIELD)?;
        let value = settings.values().get(CFG_VALUE).cloned().unwrap_or(Value::Null);
        Ok(Self::new(settings.stage(), field, value))
    }
}

impl Preprocessor for AddValueStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, document: &mut Document, context: &mut ChainContext) -> Result<()> {
        if let Err(e) = path::put(document, &self.field, self.value.clone()) {
            write_failed(context, &self.name, e);
        }
        Ok(())
    }
}
