//! Process documents through a configured chain

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use docchain_core::{Document, PipelineConfig, Value};
use docchain_preprocessors::{ProcessedDocument, StageRegistry};
use tracing::info;

use crate::output::{self, OutputFormat};

pub async fn run(
    config_path: &Path,
    input: &str,
    parallelism: Option<usize>,
    strict: bool,
    format: OutputFormat,
) -> Result<()> {
    let config = PipelineConfig::load_from_file(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    let chain = StageRegistry::from_config(&config).build_chain(&config.preprocessors)?;

    let documents = read_documents(input)?;
    let parallelism = parallelism.unwrap_or(config.runtime.parallelism);
    let strict = strict || config.runtime.strict;
    info!(documents = documents.len(), parallelism = parallelism, "Processing documents");

    let results = chain.process_batch(documents, parallelism).await;

    match format {
        OutputFormat::Text => print_text(&results),
        _ => println!("{}", output::format_structured(&results, format)?),
    }

    let rejected = results.iter().filter(|r| r.is_rejected()).count();
    if strict && rejected > 0 {
        bail!("{} of {} document(s) rejected", rejected, results.len());
    }
    Ok(())
}

fn read_documents(input: &str) -> Result<Vec<Document>> {
    let text = if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read documents from stdin")?;
        text
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))?
    };
    parse_documents(&text)
}

/// Accepts a single JSON object or an array of objects.
fn parse_documents(text: &str) -> Result<Vec<Document>> {
    match serde_json::from_str::<Value>(text).context("Input is not valid JSON")? {
        Value::Object(document) => Ok(vec![document]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(document) => Ok(document),
                _ => bail!("Input element {} is not a JSON object", index),
            })
            .collect(),
        _ => bail!("Input must be a JSON object or an array of objects"),
    }
}

fn print_text(results: &[ProcessedDocument]) {
    for (index, result) in results.iter().enumerate() {
        let title = format!(
            "Document {} ({})",
            index + 1,
            output::format_duration(result.processing_time_ms)
        );
        match &result.rejection {
            Some(reason) => output::error(&format!("{}: {}", title, reason)),
            None => output::success(&title),
        }
        for warning in &result.warnings {
            output::warning(&warning.to_string());
        }
        match serde_json::to_string_pretty(&result.document) {
            Ok(json) => println!("{}", json),
            Err(e) => output::error(&e.to_string()),
        }
    }

    let rejected = results.iter().filter(|r| r.is_rejected()).count();
    let warnings: usize = results.iter().map(|r| r.warnings.len()).sum();
    println!();
    println!(
        "{} processed, {} rejected, {} warning(s)",
        results.len().to_string().bold(),
        if rejected > 0 {
            rejected.to_string().red()
        } else {
            rejected.to_string().green()
        },
        warnings
    );
}
