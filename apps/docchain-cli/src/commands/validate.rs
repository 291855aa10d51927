//! Validate a pipeline configuration

use std::path::Path;

use anyhow::{Context, Result};
use docchain_core::PipelineConfig;
use docchain_preprocessors::StageRegistry;
use serde::Serialize;

use crate::output::{self, OutputFormat};

#[derive(Serialize)]
struct ValidationReport<'a> {
    valid: bool,
    stages: Vec<&'a str>,
    lookups: Vec<&'a str>,
}

pub fn run(config_path: &Path, format: OutputFormat) -> Result<()> {
    let config = PipelineConfig::load_from_file(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    let registry = StageRegistry::from_config(&config);
    let chain = registry.build_chain(&config.preprocessors)?;

    let report = ValidationReport {
        valid: true,
        stages: chain.list_stages(),
        lookups: registry.lookup_names(),
    };

    match format {
        OutputFormat::Text => {
            output::success(&format!("Configuration is valid: {} stage(s)", report.stages.len()));
            for (index, stage) in report.stages.iter().enumerate() {
                output::list_item(index + 1, stage);
            }
            if !report.lookups.is_empty() {
                output::section("Lookups");
                for (index, lookup) in report.lookups.iter().enumerate() {
                    output::list_item(index + 1, lookup);
                }
            }
        }
        _ => println!("{}", output::format_structured(&report, format)?),
    }
    Ok(())
}
