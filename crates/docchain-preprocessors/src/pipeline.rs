//! Preprocessor chain driver
//!
//! Runs the configured stages over documents, one document at a time per
//! call, with concurrent batch processing on blocking tasks.

use std::sync::Arc;
use std::time::Instant;

use docchain_core::{ChainContext, DataWarning, Document};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use crate::preprocessor::Preprocessor;

/// Result of running one document through the chain
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedDocument {
    /// Document as left by the last stage that ran
    pub document: Document,
    /// Data warnings recorded by the stages
    pub warnings: Vec<DataWarning>,
    /// Why the document was rejected, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<String>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    /// Processing timestamp
    pub processed_at: chrono::DateTime<chrono::Utc>,
}

impl ProcessedDocument {
    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }

    /// A document whose processing task never completed keeps its input.
    fn failed(document: Document, reason: String) -> Self {
        Self {
            document,
            warnings: Vec::new(),
            rejection: Some(reason),
            processing_time_ms: 0,
            processed_at: chrono::Utc::now(),
        }
    }
}

/// Chain statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChainStats {
    pub documents_processed: u64,
    pub documents_rejected: u64,
    pub warnings_recorded: u64,
    pub total_processing_time_ms: u64,
}

/// Ordered chain of preprocessor stages.
///
/// Cloning is cheap; clones share stages and statistics.
#[derive(Clone, Default)]
pub struct PreprocessorChain {
    stages: Vec<Arc<dyn Preprocessor>>,
    stats: Arc<Mutex<ChainStats>>,
}

impl std::fmt::Debug for PreprocessorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreprocessorChain")
            .field("stages", &self.list_stages())
            .finish()
    }
}

impl PreprocessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    pub fn add_stage(&mut self, stage: Arc<dyn Preprocessor>) {
        self.stages.push(stage);
    }

    pub fn with_stage(mut self, stage: Arc<dyn Preprocessor>) -> Self {
        self.add_stage(stage);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage over `document` in order.
    ///
    /// A stage error rejects the document and stops the chain; data warnings
    /// never do.
    pub fn process(&self, mut document: Document) -> ProcessedDocument {
        let start = Instant::now();
        let mut context = ChainContext::new();
        let mut rejection = None;

        for stage in &self.stages {
            if let Err(e) = stage.process(&mut document, &mut context) {
                warn!(stage = %stage.name(), error = %e, "Document rejected");
                rejection = Some(e.to_string());
                break;
            }
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        let warnings = context.into_warnings();

        {
            let mut stats = self.stats.lock();
            stats.documents_processed += 1;
            stats.warnings_recorded += warnings.len() as u64;
            stats.total_processing_time_ms += processing_time_ms;
            if rejection.is_some() {
                stats.documents_rejected += 1;
            }
        }

        ProcessedDocument {
            document,
            warnings,
            rejection,
            processing_time_ms,
            processed_at: chrono::Utc::now(),
        }
    }

    /// Process documents concurrently, `parallelism` at a time.
    ///
    /// Results are returned in input order.
    pub async fn process_batch(
        &self,
        documents: Vec<Document>,
        parallelism: usize,
    ) -> Vec<ProcessedDocument> {
        let total = documents.len();
        let mut results = Vec::with_capacity(total);
        let mut documents = documents.into_iter().peekable();

        while documents.peek().is_some() {
            let handles: Vec<_> = documents
                .by_ref()
                .take(parallelism.max(1))
                .map(|document| {
                    let chain = self.clone();
                    let input = document.clone();
                    (input, tokio::task::spawn_blocking(move || chain.process(document)))
                })
                .collect();

            for (input, handle) in handles {
                match handle.await {
                    Ok(result) => results.push(result),
                    Err(e) => {
                        warn!(error = %e, "Processing task failed");
                        let mut stats = self.stats.lock();
                        stats.documents_processed += 1;
                        stats.documents_rejected += 1;
                        drop(stats);
                        results.push(ProcessedDocument::failed(input, format!("Task failed: {}", e)));
                    }
                }
            }
        }

        let rejected = results.iter().filter(|r| r.is_rejected()).count();
        info!(documents = total, rejected = rejected, "Batch processed");
        results
    }

    pub fn stats(&self) -> ChainStats {
        self.stats.lock().clone()
    }

    pub fn reset_stats(&self) {
        *self.stats.lock() = ChainStats::default();
    }

    /// Stage names in chain order
    pub fn list_stages(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{doc, AddValueStage, RequiredValidatorStage};
    use crate::{ProcessError, Result};
    use serde_json::{json, Value};

    struct Warner;

    impl Preprocessor for Warner {
        fn name(&self) -> &str {
            "warner"
        }

        fn process(&self, _: &mut Document, context: &mut ChainContext) -> Result<()> {
            context.add_warning("warner", "something odd");
            Ok(())
        }
    }

    struct Rejecter;

    impl Preprocessor for Rejecter {
        fn name(&self) -> &str {
            "rejecter"
        }

        fn process(&self, _: &mut Document, _: &mut ChainContext) -> Result<()> {
            Err(ProcessError::InvalidData {
                stage: "rejecter".to_string(),
                message: "no".to_string(),
            })
        }
    }

    #[test]
    fn test_runs_stages_in_order() {
        let chain = PreprocessorChain::new()
            .with_stage(Arc::new(AddValueStage::new("first", "a", json!(1))))
            .with_stage(Arc::new(AddValueStage::new("second", "a", json!(2))))
            .with_stage(Arc::new(Warner));

        let result = chain.process(doc(json!({})));
        assert_eq!(result.document["a"], json!(2));
        assert_eq!(result.warnings.len(), 1);
        assert!(!result.is_rejected());
        assert_eq!(chain.list_stages(), vec!["first", "second", "warner"]);
    }

    #[test]
    fn test_rejection_stops_chain() {
        let chain = PreprocessorChain::new()
            .with_stage(Arc::new(Warner))
            .with_stage(Arc::new(Rejecter))
            .with_stage(Arc::new(AddValueStage::new("late", "late", json!(true))));

        let result = chain.process(doc(json!({})));
        assert!(result.is_rejected());
        assert!(!result.document.contains_key("late"));
        assert_eq!(result.warnings.len(), 1);

        let stats = chain.stats();
        assert_eq!(stats.documents_processed, 1);
        assert_eq!(stats.documents_rejected, 1);
        assert_eq!(stats.warnings_recorded, 1);

        chain.reset_stats();
        assert_eq!(chain.stats(), ChainStats::default());
    }

    #[tokio::test]
    async fn test_batch_keeps_input_order() {
        let chain = PreprocessorChain::new()
            .with_stage(Arc::new(RequiredValidatorStage::new("require id", "id")));

        let documents: Vec<Document> = (0..10)
            .map(|i| {
                if i % 3 == 0 {
                    doc(json!({"n": i}))
                } else {
                    doc(json!({"id": i, "n": i}))
                }
            })
            .collect();

        let results = chain.process_batch(documents, 3).await;
        assert_eq!(results.len(), 10);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.document["n"], Value::from(i));
            assert_eq!(result.is_rejected(), i % 3 == 0);
        }
        assert_eq!(chain.stats().documents_rejected, 4);
    }

    struct Panicker;

    impl Preprocessor for Panicker {
        fn name(&self) -> &str {
            "panicker"
        }

        fn process(&self, document: &mut Document, _: &mut ChainContext) -> Result<()> {
            if document.contains_key("boom") {
                document.insert("touched".to_string(), json!(true));
                panic!("stage blew up");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_batch_panicking_stage_keeps_input_document() {
        let chain = PreprocessorChain::new().with_stage(Arc::new(Panicker));
        let documents = vec![
            doc(json!({"n": 0})),
            doc(json!({"n": 1, "boom": true})),
            doc(json!({"n": 2})),
        ];

        let results = chain.process_batch(documents, 2).await;
        assert_eq!(results.len(), 3);
        assert!(!results[0].is_rejected());
        assert!(!results[2].is_rejected());

        let failed = &results[1];
        assert!(failed.is_rejected());
        assert!(failed.rejection.as_deref().unwrap().starts_with("Task failed"));
        assert_eq!(Value::Object(failed.document.clone()), json!({"n": 1, "boom": true}));

        let stats = chain.stats();
        assert_eq!(stats.documents_processed, 3);
        assert_eq!(stats.documents_rejected, 1);
    }

    #[tokio::test]
    async fn test_batch_with_zero_parallelism() {
        let chain = PreprocessorChain::new();
        let results = chain.process_batch(vec![doc(json!({"a": 1}))], 0).await;
        assert_eq!(results.len(), 1);
        assert!(chain.is_empty());
    }
}
