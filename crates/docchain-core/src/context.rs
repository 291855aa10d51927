//! Per document chain context
//!
//! Collects non-fatal data warnings produced by the stages processing one
//! document. A context is created for each document and discarded once the
//! document has left the chain.

use serde::{Deserialize, Serialize};

/// Warning recorded by one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataWarning {
    /// Name of the stage that produced the warning
    pub stage: String,
    /// Warning message
    pub message: String,
}

impl std::fmt::Display for DataWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)
    }
}

/// Append-only warning log shared by the whole chain for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainContext {
    warnings: Vec<DataWarning>,
}

impl ChainContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, stage: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(DataWarning {
            stage: stage.into(),
            message: message.into(),
        });
    }

    pub fn warnings(&self) -> &[DataWarning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<DataWarning> {
        self.warnings
    }
}
