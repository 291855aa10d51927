//! Stage registry
//!
//! Maps stage type ids to constructors and builds configured chains.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use docchain_core::{
    PipelineConfig, Result as SettingsResult, SettingsError, StageConfig, StageSettings,
};
use tracing::{debug, info};

use crate::enrichment::EnrichmentStage;
use crate::lookup::{InMemoryLookup, LookupCollaborator};
use crate::pipeline::PreprocessorChain;
use crate::preprocessor::Preprocessor;
use crate::stages::{
    types, AddMultipleValuesStage, AddValueStage, RegexCaptureStage, RemoveFieldsStage,
    RequiredValidatorStage, TrimStringStage, ValueMapperStage, ValuesCollectingStage,
};

/// Named lookup collaborators available to stages
pub type Lookups = HashMap<String, Arc<dyn LookupCollaborator>>;

/// Builds a stage from its settings
pub type StageConstructor = Arc<
    dyn Fn(&StageSettings<'_>, &Lookups) -> SettingsResult<Arc<dyn Preprocessor>> + Send + Sync,
>;

/// Registry of stage types and lookup collaborators
#[derive(Clone, Default)]
pub struct StageRegistry {
    constructors: BTreeMap<String, StageConstructor>,
    lookups: Lookups,
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRegistry")
            .field("stage_types", &self.stage_types())
            .field("lookups", &self.lookups.keys().collect::<Vec<_>>())
            .finish()
    }
}

macro_rules! builtin {
    ($registry:expr, $kind:expr, $stage:ty) => {
        $registry.register($kind, |settings, _| {
            Ok(Arc::new(<$stage>::from_settings(settings)?) as Arc<dyn Preprocessor>)
        })
    };
}

impl StageRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with all built-in stage types
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        builtin!(registry, types::ADD_VALUE, AddValueStage);
        builtin!(registry, types::ADD_MULTIPLE_VALUES, AddMultipleValuesStage);
        builtin!(registry, types::REMOVE_FIELDS, RemoveFieldsStage);
        builtin!(registry, types::TRIM_STRING, TrimStringStage);
        builtin!(registry, types::REGEX_CAPTURE, RegexCaptureStage);
        builtin!(registry, types::VALUE_MAPPER, ValueMapperStage);
        builtin!(registry, types::REQUIRED, RequiredValidatorStage);
        builtin!(registry, types::VALUES_COLLECTING, ValuesCollectingStage);
        registry.register(types::LOOKUP, |settings, lookups| {
            Ok(Arc::new(EnrichmentStage::from_settings(settings, lookups)?) as Arc<dyn Preprocessor>)
        });
        registry
    }

    /// Built-in stage types plus an in-memory collaborator per configured
    /// lookup table.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut registry = Self::with_defaults();
        for (name, table) in &config.lookups {
            let lookup = InMemoryLookup::from_config(table);
            debug!(lookup = %name, records = lookup.len(), "Registered lookup table");
            registry.add_lookup(name.clone(), Arc::new(lookup));
        }
        registry
    }

    /// Register a stage type, replacing any previous constructor for it.
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F)
    where
        F: Fn(&StageSettings<'_>, &Lookups) -> SettingsResult<Arc<dyn Preprocessor>>
            + Send
            + Sync
            + 'static,
    {
        self.constructors.insert(kind.into(), Arc::new(constructor));
    }

    pub fn add_lookup(&mut self, name: impl Into<String>, lookup: Arc<dyn LookupCollaborator>) {
        self.lookups.insert(name.into(), lookup);
    }

    pub fn with_lookup(mut self, name: impl Into<String>, lookup: Arc<dyn LookupCollaborator>) -> Self {
        self.add_lookup(name, lookup);
        self
    }

    /// Registered stage type ids, sorted
    pub fn stage_types(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    pub fn lookup_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.lookups.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build one stage.
    pub fn build(&self, config: &StageConfig) -> SettingsResult<Arc<dyn Preprocessor>> {
        let name = config.name.trim();
        if name.is_empty() {
            return Err(SettingsError::MissingName);
        }
        let kind = config.kind.trim();
        if kind.is_empty() {
            return Err(SettingsError::MissingType {
                stage: name.to_string(),
            });
        }

        let constructor = self
            .constructors
            .get(kind)
            .ok_or_else(|| SettingsError::UnknownType {
                stage: name.to_string(),
                kind: kind.to_string(),
            })?;

        let settings = StageSettings::required(name, config.settings.as_ref())?;
        let stage = constructor(&settings, &self.lookups)?;
        debug!(stage = %name, kind = %kind, "Stage built");
        Ok(stage)
    }

    /// Build a chain from stage configurations, failing on the first error.
    pub fn build_chain(&self, configs: &[StageConfig]) -> SettingsResult<PreprocessorChain> {
        let mut chain = PreprocessorChain::new();
        for config in configs {
            chain.add_stage(self.build(config)?);
        }
        info!(stages = chain.len(), "Preprocessor chain built");
        Ok(chain)
    }
}
