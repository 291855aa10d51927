//! Document Preprocessors for docchain
//!
//! This crate provides the configurable stages that transform documents
//! before they are indexed, and the driver that runs a chain of them.
//!
//! # Features
//!
//! - Stage trait and a registry building stages from configuration
//! - Fan-out of a stage over sub-documents reachable by "source bases"
//! - Keyed lookup enrichment with per run caching and default values
//! - Built-in stages for adding, removing, trimming, mapping, capturing,
//!   collecting and validating values
//! - Sequential per document chain, concurrent batch processing

pub mod enrichment;
pub mod fanout;
pub mod lookup;
pub mod pipeline;
pub mod preprocessor;
pub mod registry;
pub mod stages;

// Re-exports
pub use enrichment::{EnrichmentStage, KeySource, ResultMapping};
pub use fanout::FanOutRunner;
pub use lookup::{InMemoryLookup, LookupCache, LookupCollaborator, LookupError, LookupResponse};
pub use pipeline::{ChainStats, PreprocessorChain, ProcessedDocument};
pub use preprocessor::Preprocessor;
pub use registry::{Lookups, StageConstructor, StageRegistry};

/// Error returned by a stage while processing a document.
///
/// Data problems are recorded as warnings in the chain context instead; an
/// error here means the document must not continue through the chain.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("invalid document rejected by '{stage}': {message}")]
    InvalidData { stage: String, message: String },
}

pub type Result<T> = std::result::Result<T, ProcessError>;
