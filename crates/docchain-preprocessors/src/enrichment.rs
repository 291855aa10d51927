//! Lookup enrichment stage
//!
//! Extracts a key from each (sub-)document, asks a [`LookupCollaborator`]
//! for a set of fields and writes them to configured target paths. Lookups
//! are memoized per run, so repeated keys across source bases hit the
//! collaborator only once. Missing matches and collaborator failures fall
//! back to per field default templates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use docchain_core::document::trim_to_null;
use docchain_core::path;
use docchain_core::{
    value_to_string, ChainContext, Document, SettingsError, StageSettings, Template, Value,
};
use tracing::{debug, warn};

use crate::fanout::FanOutRunner;
use crate::lookup::{LookupCache, LookupCollaborator};
use crate::preprocessor::{data_warning, write_failed, Preprocessor};
use crate::Result;

pub const CFG_LOOKUP: &str = "lookup";
pub const CFG_SOURCE_FIELD: &str = "source_field";
pub const CFG_SOURCE_TEMPLATE: &str = "source_template";
pub const CFG_RESULT_MAPPING: &str = "result_mapping";
pub const CFG_LOOKUP_FIELD: &str = "lookup_field";
pub const CFG_TARGET_FIELD: &str = "target_field";
pub const CFG_VALUE_DEFAULT: &str = "value_default";

/// Where the lookup key comes from.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Value at a path of the sub-document
    Field(String),
    /// Template rendered against the sub-document
    Template(Template),
}

/// One requested lookup field and where its value goes.
#[derive(Debug, Clone)]
pub struct ResultMapping {
    pub lookup_field: String,
    pub target_field: String,
    /// Rendered with the lookup key as `{__original}` when no value is found
    pub value_default: Option<Template>,
}

impl ResultMapping {
    pub fn new(lookup_field: impl Into<String>, target_field: impl Into<String>) -> Self {
        Self {
            lookup_field: lookup_field.into(),
            target_field: target_field.into(),
            value_default: None,
        }
    }

    pub fn with_default(mut self, template: impl Into<String>) -> Self {
        self.value_default = Some(Template::new(template));
        self
    }

    fn from_settings(settings: &StageSettings<'_>) -> std::result::Result<Self, SettingsError> {
        Ok(Self {
            lookup_field: settings.required_str(CFG_LOOKUP_FIELD)?,
            target_field: settings.required_str(CFG_TARGET_FIELD)?,
            value_default: settings.optional_str(CFG_VALUE_DEFAULT)?.map(Template::new),
        })
    }
}

/// Stage enriching documents with values from a keyed lookup.
pub struct EnrichmentStage {
    name: String,
    key_source: KeySource,
    mappings: Vec<ResultMapping>,
    requested_fields: Vec<String>,
    lookup: Arc<dyn LookupCollaborator>,
    runner: FanOutRunner,
    /// Suppresses repeated failure logs until a lookup succeeds again.
    failure_logged: AtomicBool,
}

impl std::fmt::Debug for EnrichmentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentStage")
            .field("name", &self.name)
            .field("key_source", &self.key_source)
            .field("mappings", &self.mappings)
            .field("bases", &self.runner.bases())
            .finish()
    }
}

impl EnrichmentStage {
    pub fn new(
        name: impl Into<String>,
        key_source: KeySource,
        mappings: Vec<ResultMapping>,
        lookup: Arc<dyn LookupCollaborator>,
    ) -> Self {
        let name = name.into();
        let requested_fields = mappings.iter().map(|m| m.lookup_field.clone()).collect();
        Self {
            runner: FanOutRunner::new(name.clone(), Vec::new()),
            name,
            key_source,
            mappings,
            requested_fields,
            lookup,
            failure_logged: AtomicBool::new(false),
        }
    }

    pub fn with_source_bases(mut self, bases: Vec<String>) -> Self {
        self.runner = FanOutRunner::new(self.name.clone(), bases);
        self
    }

    /// Build the stage from settings, resolving the named collaborator.
    pub fn from_settings(
        settings: &StageSettings<'_>,
        lookups: &HashMap<String, Arc<dyn LookupCollaborator>>,
    ) -> std::result::Result<Self, SettingsError> {
        let lookup_name = settings.required_str(CFG_LOOKUP)?;
        let lookup = lookups
            .get(&lookup_name)
            .cloned()
            .ok_or_else(|| SettingsError::UnknownLookup {
                stage: settings.stage().to_string(),
                lookup: lookup_name.clone(),
            })?;

        let key_source = match (
            settings.optional_str(CFG_SOURCE_FIELD)?,
            settings.optional_str(CFG_SOURCE_TEMPLATE)?,
        ) {
            (Some(field), None) => KeySource::Field(field),
            (None, Some(template)) => KeySource::Template(Template::new(template)),
            (None, None) => return Err(settings.missing(CFG_SOURCE_FIELD)),
            (Some(_), Some(_)) => {
                return Err(settings.invalid(
                    CFG_SOURCE_TEMPLATE,
                    format!("can't be combined with '{}'", CFG_SOURCE_FIELD),
                ))
            }
        };

        let mappings = read_result_mappings(settings)?;
        let runner = FanOutRunner::from_settings(settings)?;

        Ok(Self::new(settings.stage(), key_source, mappings, lookup)
            .with_source_bases(runner.bases().to_vec()))
    }

    pub fn mappings(&self) -> &[ResultMapping] {
        &self.mappings
    }

    pub fn key_source(&self) -> &KeySource {
        &self.key_source
    }

    /// Enrich one sub-document reached through `base`.
    pub fn apply(
        &self,
        document: &mut Document,
        base: Option<&str>,
        cache: &mut LookupCache,
        chain: &mut ChainContext,
    ) {
        let Some(key) = self.extract_key(document) else {
            debug!(stage = %self.name, "No lookup key, skipped");
            return;
        };
        let source = self.source_label(base);

        let values = match key {
            Value::Array(keys) => {
                let mut collected: Vec<Vec<Value>> = vec![Vec::new(); self.mappings.len()];
                for element in keys.iter().filter(|k| !k.is_null()) {
                    let resolved = self.resolve(element, &source, document, cache, chain);
                    for (slot, value) in collected.iter_mut().zip(resolved) {
                        if !value.is_null() {
                            slot.push(value);
                        }
                    }
                }
                collected.into_iter().map(Value::Array).collect()
            }
            key => self.resolve(&key, &source, document, cache, chain),
        };

        for (mapping, value) in self.mappings.iter().zip(values) {
            if let Err(e) = path::put(document, &mapping.target_field, value) {
                write_failed(chain, &self.name, e);
            }
        }
    }

    /// Full name of the key source, for warnings.
    fn source_label(&self, base: Option<&str>) -> String {
        match &self.key_source {
            KeySource::Field(field) => path::full_field_name(base, field),
            KeySource::Template(template) => path::full_field_name(base, template.source()),
        }
    }

    fn extract_key(&self, document: &Document) -> Option<Value> {
        match &self.key_source {
            KeySource::Field(field) => path::extract(document, field).map(|v| v.into_owned()),
            KeySource::Template(template) => {
                let rendered = template.render(Some(document), None, None);
                if trim_to_null(&rendered).is_some() {
                    Some(Value::String(rendered))
                } else {
                    None
                }
            }
        }
    }

    /// Per mapping values for one key, from the cache or the collaborator.
    fn resolve(
        &self,
        key: &Value,
        source: &str,
        document: &Document,
        cache: &mut LookupCache,
        chain: &mut ChainContext,
    ) -> Vec<Value> {
        if let Some(cached) = cache.get(key) {
            return cached.to_vec();
        }

        let matched = self.call_lookup(key, source, chain);
        let values: Vec<Value> = self
            .mappings
            .iter()
            .map(|mapping| {
                matched
                    .as_ref()
                    .and_then(|fields| fields.get(&mapping.lookup_field))
                    .filter(|v| !v.is_null())
                    .cloned()
                    .or_else(|| {
                        mapping
                            .value_default
                            .as_ref()
                            .map(|t| Value::String(t.render(Some(document), Some(key), None)))
                    })
                    .unwrap_or(Value::Null)
            })
            .collect();

        cache.insert(key, values.clone());
        values
    }

    /// Call the collaborator; `None` when nothing usable was found.
    fn call_lookup(&self, key: &Value, source: &str, chain: &mut ChainContext) -> Option<Document> {
        let key_display = value_to_string(key).unwrap_or_default();
        match self.lookup.lookup(key, &self.requested_fields) {
            Ok(response) => {
                self.failure_logged.store(false, Ordering::Relaxed);
                if response.match_count == 0 {
                    debug!(stage = %self.name, key = %key_display, "No lookup match");
                    return None;
                }
                if response.match_count > 1 {
                    data_warning(
                        chain,
                        &self.name,
                        format!(
                            "Multiple results found for lookup key '{}' from '{}', using first",
                            key_display, source
                        ),
                    );
                }
                Some(response.fields)
            }
            Err(e) => {
                if !self.failure_logged.swap(true, Ordering::Relaxed) {
                    warn!(
                        stage = %self.name,
                        error = %e,
                        "Lookup failed, default values are used instead"
                    );
                }
                chain.add_warning(
                    self.name.as_str(),
                    format!("Lookup failed for key '{}' from '{}': {}", key_display, source, e),
                );
                None
            }
        }
    }
}

fn read_result_mappings(
    settings: &StageSettings<'_>,
) -> std::result::Result<Vec<ResultMapping>, SettingsError> {
    match settings.raw(CFG_RESULT_MAPPING) {
        Some(Value::Array(entries)) if !entries.is_empty() => entries
            .iter()
            .map(|entry| match entry {
                Value::Object(map) => ResultMapping::from_settings(&settings.nested(map)),
                _ => Err(settings.invalid(CFG_RESULT_MAPPING, "entries must be objects")),
            })
            .collect(),
        Some(Value::Array(_)) => Err(settings.missing(CFG_RESULT_MAPPING)),
        Some(_) => Err(settings.invalid(CFG_RESULT_MAPPING, "must be a list")),
        None if settings.raw(CFG_LOOKUP_FIELD).is_some() => {
            Ok(vec![ResultMapping::from_settings(settings)?])
        }
        None => Err(settings.missing(CFG_RESULT_MAPPING)),
    }
}

impl Preprocessor for EnrichmentStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, document: &mut Document, context: &mut ChainContext) -> Result<()> {
        self.runner.run(
            document,
            LookupCache::new,
            |sub, cache, base, chain| match cache {
                Some(cache) => self.apply(sub, base, cache, chain),
                None => self.apply(sub, base, &mut LookupCache::new(), chain),
            },
            context,
        );
        Ok(())
    }
}
