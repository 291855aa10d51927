//! Source base fan-out
//!
//! Runs a per sub-document function either once over the whole document or
//! once for every sub-document reachable through the configured source
//! bases, so one stage definition can serve `author`, `editor` and every
//! element of `comments.author` alike.

use docchain_core::path::{self, Resolved};
use docchain_core::{ChainContext, Document, Result as SettingsResult, StageSettings, Value};

use crate::preprocessor::data_warning;

/// Settings key holding the list of source bases.
pub const CFG_SOURCE_BASES: &str = "source_bases";

/// Applies a transformation per resolved source base.
#[derive(Debug, Clone)]
pub struct FanOutRunner {
    stage: String,
    bases: Vec<String>,
}

impl FanOutRunner {
    pub fn new(stage: impl Into<String>, bases: Vec<String>) -> Self {
        Self {
            stage: stage.into(),
            bases,
        }
    }

    /// Read the optional `source_bases` list from stage settings.
    pub fn from_settings(settings: &StageSettings<'_>) -> SettingsResult<Self> {
        let bases = settings.string_list(CFG_SOURCE_BASES)?.unwrap_or_default();
        Ok(Self::new(settings.stage(), bases))
    }

    pub fn bases(&self) -> &[String] {
        &self.bases
    }

    /// Run `per_sub_document` over `document`.
    ///
    /// Without bases the function is called once with the whole document and
    /// no shared context. Otherwise `make_context` is called once and its
    /// result is handed to every invocation, in base order and then element
    /// order. Absent bases are skipped silently; values that are not
    /// documents are skipped with a warning.
    pub fn run<C, M, F>(
        &self,
        document: &mut Document,
        make_context: M,
        mut per_sub_document: F,
        chain: &mut ChainContext,
    ) where
        M: FnOnce() -> C,
        F: FnMut(&mut Document, Option<&mut C>, Option<&str>, &mut ChainContext),
    {
        if self.bases.is_empty() {
            per_sub_document(document, None, None, chain);
            return;
        }

        let mut shared = make_context();
        for base in &self.bases {
            match path::resolve_mut(document, base) {
                Resolved::Absent => {}
                Resolved::Node(Value::Object(sub)) => {
                    per_sub_document(sub, Some(&mut shared), Some(base.as_str()), chain);
                }
                Resolved::Node(Value::Array(items)) => {
                    for item in items.iter_mut() {
                        self.visit_element(item, base, &mut shared, &mut per_sub_document, chain);
                    }
                }
                Resolved::Node(_) => {
                    data_warning(
                        chain,
                        &self.stage,
                        format!(
                            "Field '{}' contains invalid value which can't be processed as source base, so is skipped",
                            base
                        ),
                    );
                }
                Resolved::Collected(nodes) => {
                    for node in nodes {
                        self.visit_element(node, base, &mut shared, &mut per_sub_document, chain);
                    }
                }
            }
        }
    }

    fn visit_element<C, F>(
        &self,
        element: &mut Value,
        base: &str,
        shared: &mut C,
        per_sub_document: &mut F,
        chain: &mut ChainContext,
    ) where
        F: FnMut(&mut Document, Option<&mut C>, Option<&str>, &mut ChainContext),
    {
        match element {
            Value::Object(sub) => per_sub_document(sub, Some(shared), Some(base), chain),
            _ => data_warning(
                chain,
                &self.stage,
                format!(
                    "Collection in field '{}' contains value which is not a document, so is skipped",
                    base
                ),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn test_no_bases_runs_once_on_whole_document() {
        let runner = FanOutRunner::new("stage", Vec::new());
        let mut d = doc(json!({"a": 1}));
        let mut chain = ChainContext::new();
        let mut calls = 0;

        runner.run(
            &mut d,
            || 0usize,
            |sub, shared, base, _| {
                calls += 1;
                assert!(shared.is_none());
                assert!(base.is_none());
                sub.insert("touched".to_string(), json!(true));
            },
            &mut chain,
        );

        assert_eq!(calls, 1);
        assert_eq!(d["touched"], json!(true));
    }

    #[test]
    fn test_skip_warnings_follow_base_and_element_order() {
        let runner = FanOutRunner::new(
            "stage",
            vec!["x".to_string(), "list".to_string(), "y".to_string()],
        );
        let mut d = doc(json!({
            "x": 1,
            "list": [{"id": 1}, "bad", {"id": 2}, 3],
            "y": "s"
        }));
        let mut chain = ChainContext::new();
        let mut ids = Vec::new();

        runner.run(&mut d, || (), |sub, _, _, _| ids.push(sub["id"].clone()), &mut chain);

        assert_eq!(ids, vec![json!(1), json!(2)]);
        let messages: Vec<&str> = chain.warnings().iter().map(|w| w.message.as_str()).collect();
        assert_eq!(messages.len(), 4);
        assert!(messages[0].starts_with("Field 'x'"));
        assert!(messages[1].starts_with("Collection in field 'list'"));
        assert!(messages[2].starts_with("Collection in field 'list'"));
        assert!(messages[3].starts_with("Field 'y'"));
    }

    #[test]
    fn test_scalar_base_is_skipped_with_warning() {
        let runner = FanOutRunner::new("stage", vec!["a".to_string(), "b".to_string()]);
        let mut d = doc(json!({"a": {"x": 1}, "b": 5}));
        let mut chain = ChainContext::new();
        let mut seen = Vec::new();

        runner.run(
            &mut d,
            || (),
            |sub, _, base, _| seen.push((base.map(str::to_string), sub.clone())),
            &mut chain,
        );

        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.as_deref(), Some("a"));
        assert_eq!(chain.warnings().len(), 1);
        assert_eq!(chain.warnings()[0].stage, "stage");
        assert!(chain.warnings()[0].message.contains("'b'"));
    }

    #[test]
    fn test_sequence_base_and_shared_context() {
        let runner = FanOutRunner::new(
            "stage",
            vec!["author".to_string(), "comments".to_string(), "missing".to_string()],
        );
        let mut d = doc(json!({
            "author": {"id": "1"},
            "comments": [{"id": "2"}, "not a document", {"id": "3"}]
        }));
        let mut chain = ChainContext::new();

        runner.run(
            &mut d,
            Vec::<String>::new,
            |sub, shared, _, _| {
                let shared = shared.expect("shared context with bases");
                let id = sub["id"].as_str().unwrap_or_default().to_string();
                shared.push(id);
                sub.insert("order".to_string(), json!(shared.len()));
            },
            &mut chain,
        );

        assert_eq!(d["author"]["order"], json!(1));
        assert_eq!(d["comments"][0]["order"], json!(2));
        assert_eq!(d["comments"][2]["order"], json!(3));
        assert_eq!(chain.warnings().len(), 1);
        assert!(chain.warnings()[0].message.contains("not a document"));
    }

    #[test]
    fn test_base_across_sequence_elements() {
        let runner = FanOutRunner::new("stage", vec!["comments.author".to_string()]);
        let mut d = doc(json!({
            "comments": [{"author": {"id": "1"}}, {"author": {"id": "2"}}, {"text": "x"}]
        }));
        let mut chain = ChainContext::new();
        let mut calls = 0;

        runner.run(
            &mut d,
            || (),
            |sub, _, base, _| {
                calls += 1;
                assert_eq!(base, Some("comments.author"));
                sub.insert("seen".to_string(), json!(true));
            },
            &mut chain,
        );

        assert_eq!(calls, 2);
        assert_eq!(d["comments"][1]["author"]["seen"], json!(true));
        assert!(!chain.has_warnings());
    }

    #[test]
    fn test_from_settings() {
        let values = doc(json!({"source_bases": ["a", "b"]}));
        let runner = FanOutRunner::from_settings(&StageSettings::new("s", &values)).unwrap();
        assert_eq!(runner.bases(), &["a".to_string(), "b".to_string()]);

        let empty = Document::new();
        let runner = FanOutRunner::from_settings(&StageSettings::new("s", &empty)).unwrap();
        assert!(runner.bases().is_empty());
    }
}
