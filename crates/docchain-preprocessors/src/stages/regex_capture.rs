//! Splits a string value into capture groups written to separate fields.

use docchain_core::path;
use docchain_core::{ChainContext, Document, Result as SettingsResult, StageSettings, Value};
use regex::Regex;

use super::CFG_SOURCE_FIELD;
use crate::fanout::FanOutRunner;
use crate::preprocessor::{data_warning, write_failed, Preprocessor};
use crate::Result;

pub const CFG_PATTERN: &str = "pattern";
pub const CFG_RESULT_MAPPING: &str = "result_mapping";

#[derive(Debug, Clone)]
pub struct RegexCaptureStage {
    name: String,
    source_field: String,
    pattern: Regex,
    /// (group index, target path)
    mapping: Vec<(usize, String)>,
    runner: FanOutRunner,
}

impl RegexCaptureStage {
    pub fn from_settings(settings: &StageSettings<'_>) -> SettingsResult<Self> {
        let source = settings.required_str(CFG_PATTERN)?;
        // whole value match
        let pattern = Regex::new(&format!(r"\A(?:{})\z", source))
            .map_err(|e| settings.invalid(CFG_PATTERN, e.to_string()))?;

        let entries = settings
            .object(CFG_RESULT_MAPPING)?
            .filter(|m| !m.is_empty())
            .ok_or_else(|| settings.missing(CFG_RESULT_MAPPING))?;

        let mut mapping = Vec::with_capacity(entries.len());
        for (index, target) in entries {
            let group: usize = index.trim().parse().map_err(|_| {
                settings.invalid(CFG_RESULT_MAPPING, format!("group index '{}' is not a number", index))
            })?;
            if group >= pattern.captures_len() {
                return Err(settings.invalid(
                    CFG_RESULT_MAPPING,
                    format!("pattern has no group {}", group),
                ));
            }
            let target = target
                .as_str()
                .and_then(docchain_core::document::trim_to_null)
                .ok_or_else(|| settings.invalid(CFG_RESULT_MAPPING, "targets must be field names"))?;
            mapping.push((group, target.to_string()));
        }

        Ok(Self {
            name: settings.stage().to_string(),
            source_field: settings.required_str(CFG_SOURCE_FIELD)?,
            pattern,
            mapping,
            runner: FanOutRunner::from_settings(settings)?,
        })
    }

    fn capture(&self, document: &mut Document, base: Option<&str>, context: &mut ChainContext) {
        let groups: Vec<Value> = match path::extract(document, &self.source_field).as_deref() {
            None => return,
            Some(Value::String(s)) => match self.pattern.captures(s) {
                Some(captures) => self
                    .mapping
                    .iter()
                    .map(|(group, _)| {
                        captures
                            .get(*group)
                            .map(|m| Value::String(m.as_str().to_string()))
                            .unwrap_or(Value::Null)
                    })
                    .collect(),
                None => {
                    data_warning(
                        context,
                        &self.name,
                        format!(
                            "Value for field '{}' doesn't match the pattern",
                            path::full_field_name(base, &self.source_field)
                        ),
                    );
                    return;
                }
            },
            Some(_) => {
                data_warning(
                    context,
                    &self.name,
                    format!(
                        "Value for field '{}' is not a string",
                        path::full_field_name(base, &self.source_field)
                    ),
                );
                return;
            }
        };

        for ((_, target), value) in self.mapping.iter().zip(groups) {
            if let Err(e) = path::put(document, target, value) {
                write_failed(context, &self.name, e);
            }
        }
    }
}

impl Preprocessor for RegexCaptureStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, document: &mut Document, context: &mut ChainContext) -> Result<()> {
        self.runner
            .run(document, || (), |sub, _, base, chain| self.capture(sub, base, chain), context);
        Ok(())
    }
}
