//! Trims and shortens a string value.

use docchain_core::path;
use docchain_core::{ChainContext, Document, Result as SettingsResult, StageSettings, Value};

use super::{CFG_SOURCE_FIELD, CFG_TARGET_FIELD};
use crate::fanout::FanOutRunner;
use crate::preprocessor::{data_warning, write_failed, Preprocessor};
use crate::Result;

pub const CFG_MAX_SIZE: &str = "max_size";

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone)]
pub struct TrimStringStage {
    name: String,
    source_field: String,
    target_field: String,
    max_size: usize,
    runner: FanOutRunner,
}

impl TrimStringStage {
    pub fn from_settings(settings: &StageSettings<'_>) -> SettingsResult<Self> {
        let max_size = settings.required_int(CFG_MAX_SIZE)?;
        if max_size < 1 {
            return Err(settings.invalid(CFG_MAX_SIZE, "must be positive"));
        }

        Ok(Self {
            name: settings.stage().to_string(),
            source_field: settings.required_str(CFG_SOURCE_FIELD)?,
            target_field: settings.required_str(CFG_TARGET_FIELD)?,
            max_size: max_size as usize,
            runner: FanOutRunner::from_settings(settings)?,
        })
    }

    fn trim(&self, document: &mut Document, base: Option<&str>, context: &mut ChainContext) {
        let trimmed = match path::extract(document, &self.source_field).as_deref() {
            None => return,
            Some(Value::String(s)) => shorten(s.trim(), self.max_size),
            Some(_) => {
                data_warning(
                    context,
                    &self.name,
                    format!(
                        "Value for field '{}' is not a string, so can't be trimmed",
                        path::full_field_name(base, &self.source_field)
                    ),
                );
                return;
            }
        };

        if let Err(e) = path::put(document, &self.target_field, Value::String(trimmed)) {
            write_failed(context, &self.name, e);
        }
    }
}

/// Cut `value` to at most `max_size` characters, marking the cut with an
/// ellipsis when there is room for one.
fn shorten(value: &str, max_size: usize) -> String {
    if value.chars().count() <= max_size {
        return value.to_string();
    }
    if max_size > 4 {
        let mut out: String = value.chars().take(max_size - ELLIPSIS.len()).collect();
        out.push_str(ELLIPSIS);
        out
    } else {
        value.chars().take(max_size).collect()
    }
}

impl Preprocessor for TrimStringStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, document: &mut Document, context: &mut ChainContext) -> Result<()> {
        self.runner
            .run(document, || (), |sub, _, base, chain| self.trim(sub, base, chain), context);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::doc;
    use serde_json::json;

    fn stage(max_size: i64) -> TrimStringStage {
        let values = doc(json!({
            "source_field": "text",
            "target_field": "short",
            "max_size": max_size
        }));
        TrimStringStage::from_settings(&StageSettings::new("trim", &values)).unwrap()
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("hello", 10), "hello");
        assert_eq!(shorten("hello world", 8), "hello...");
        assert_eq!(shorten("hello", 4), "hell");
        assert_eq!(shorten("žluťoučký kůň", 7), "žluť...");
    }

    #[test]
    fn test_trims_into_target() {
        let mut d = doc(json!({"text": "  a rather long text  "}));
        let mut ctx = ChainContext::new();
        stage(10).process(&mut d, &mut ctx).unwrap();

        assert_eq!(d["short"], json!("a rathe..."));
        assert_eq!(d["text"], json!("  a rather long text  "));
    }

    #[test]
    fn test_non_string_source_warns() {
        let mut d = doc(json!({"text": 12}));
        let mut ctx = ChainContext::new();
        stage(10).process(&mut d, &mut ctx).unwrap();

        assert!(!d.contains_key("short"));
        assert_eq!(ctx.warnings().len(), 1);
    }

    #[test]
    fn test_warning_names_field_under_base() {
        let values = doc(json!({
            "source_field": "text",
            "target_field": "short",
            "max_size": 10,
            "source_bases": ["author", "comments"]
        }));
        let stage = TrimStringStage::from_settings(&StageSettings::new("trim", &values)).unwrap();
        let mut d = doc(json!({
            "author": {"text": 1},
            "comments": [{"text": "ok"}, {"text": 2}]
        }));
        let mut ctx = ChainContext::new();
        stage.process(&mut d, &mut ctx).unwrap();

        assert_eq!(d["comments"][0]["short"], json!("ok"));
        let messages: Vec<&str> = ctx.warnings().iter().map(|w| w.message.as_str()).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("'author.text'"));
        assert!(messages[1].contains("'comments.text'"));
    }

    #[test]
    fn test_absent_source_is_ignored() {
        let mut d = doc(json!({"other": "x"}));
        let mut ctx = ChainContext::new();
        stage(10).process(&mut d, &mut ctx).unwrap();

        assert!(!d.contains_key("short"));
        assert!(!ctx.has_warnings());
    }

    #[test]
    fn test_invalid_max_size() {
        let values = doc(json!({"source_field": "a", "target_field": "b", "max_size": 0}));
        assert!(TrimStringStage::from_settings(&StageSettings::new("s", &values)).is_err());
        let values = doc(json!({"source_field": "a", "target_field": "b", "max_size": "ten"}));
        assert!(TrimStringStage::from_settings(&StageSettings::new("s", &values)).is_err());
    }
}
