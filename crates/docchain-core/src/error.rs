//! Error types shared by every docchain crate.

use std::fmt;
use thiserror::Error;

/// Operation that walked a path when a [`PathError`] was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOperation {
    Put,
    Delete,
}

impl fmt::Display for PathOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathOperation::Put => write!(f, "put"),
            PathOperation::Delete => write!(f, "remove"),
        }
    }
}

/// Errors raised by path based writes and deletes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path argument must be defined")]
    EmptyPath,

    #[error("can't {operation} value for field '{path}' because element '{segment}' in the path is not a mapping")]
    StructureConflict {
        operation: PathOperation,
        path: String,
        segment: String,
    },
}

/// Configuration errors. These are raised while building stages and never
/// while processing a document.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("'settings' section is not defined for preprocessor '{stage}'")]
    MissingSection { stage: String },

    #[error("missing or empty 'settings/{field}' configuration value for '{stage}' preprocessor")]
    Missing { stage: String, field: String },

    #[error("invalid 'settings/{field}' configuration value for '{stage}' preprocessor: {reason}")]
    Invalid {
        stage: String,
        field: String,
        reason: String,
    },

    #[error("'name' element not defined for preprocessor")]
    MissingName,

    #[error("'type' element not defined for preprocessor '{stage}'")]
    MissingType { stage: String },

    #[error("unknown preprocessor type '{kind}' for preprocessor '{stage}'")]
    UnknownType { stage: String, kind: String },

    #[error("unknown lookup '{lookup}' referenced by preprocessor '{stage}'")]
    UnknownLookup { stage: String, lookup: String },

    #[error("failed to load pipeline configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid pipeline configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SettingsError {
    pub fn missing(stage: &str, field: &str) -> Self {
        Self::Missing {
            stage: stage.to_string(),
            field: field.to_string(),
        }
    }

    pub fn invalid(stage: &str, field: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            stage: stage.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SettingsError>;
