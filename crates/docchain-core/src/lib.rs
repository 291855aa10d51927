//! Core building blocks of the docchain preprocessing pipeline.
//!
//! - [`document`]: the document value model
//! - [`path`]: dotted path reads, writes and deletes
//! - [`template`]: placeholder rendering with pluggable encoders
//! - [`context`]: per document warning log shared by a stage chain
//! - [`settings`] and [`config`]: stage settings readers and pipeline
//!   configuration loading

pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod path;
pub mod settings;
pub mod template;

pub use config::{LookupTableConfig, PipelineConfig, RuntimeConfig, StageConfig};
pub use context::{ChainContext, DataWarning};
pub use document::{value_to_string, CopyMode, Document, Map, Value};
pub use error::{PathError, PathOperation, Result, SettingsError};
pub use settings::StageSettings;
pub use template::{JsonStringEncoder, Template, UrlEncoder, ValueEncoder, ORIGINAL_VALUE_KEY};
