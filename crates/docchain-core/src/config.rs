use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::document::{Document, Map, Value};
use crate::error::Result;

/// Prefix of environment variables overriding file configuration.
pub const ENV_PREFIX: &str = "DOCCHAIN";

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Stages in chain order
    #[serde(default)]
    pub preprocessors: Vec<StageConfig>,
    /// Named in-memory lookup tables
    #[serde(default)]
    pub lookups: BTreeMap<String, LookupTableConfig>,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl PipelineConfig {
    /// Load configuration from a file with environment overrides.
    ///
    /// The file format follows its extension (JSON, YAML or TOML).
    /// Environment variables use the `DOCCHAIN` prefix and `__` as separator,
    /// e.g. `DOCCHAIN__RUNTIME__PARALLELISM=8`.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        debug!(
            path = %path.as_ref().display(),
            stages = config.preprocessors.len(),
            lookups = config.lookups.len(),
            "Pipeline configuration loaded"
        );
        Ok(config)
    }

    /// Build configuration from an in-memory JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Configuration of one stage instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Stage instance name, used in warnings and logs
    #[serde(default)]
    pub name: String,
    /// Registered stage type identifier
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Flat stage settings
    #[serde(default)]
    pub settings: Option<Map<String, Value>>,
}

impl StageConfig {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            settings: None,
        }
    }

    pub fn with_settings(mut self, settings: Value) -> Self {
        self.settings = match settings {
            Value::Object(map) => Some(map),
            _ => None,
        };
        self
    }
}

/// Static lookup table served by an in-memory collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupTableConfig {
    /// Record field matched against lookup keys
    pub key_field: String,
    /// Table records
    #[serde(default)]
    pub records: Vec<Document>,
}

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Number of documents processed concurrently
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Treat rejected documents as a failed run
    #[serde(default)]
    pub strict: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            strict: false,
        }
    }
}

fn default_parallelism() -> usize {
    4
}
