//! List registered stage types

use anyhow::Result;
use docchain_preprocessors::StageRegistry;

use crate::output::{self, OutputFormat};

pub fn run(format: OutputFormat) -> Result<()> {
    let registry = StageRegistry::with_defaults();
    let types = registry.stage_types();

    match format {
        OutputFormat::Text => {
            output::section("Stage types");
            for (index, kind) in types.iter().enumerate() {
                output::list_item(index + 1, kind);
            }
        }
        _ => println!("{}", output::format_structured(&types, format)?),
    }
    Ok(())
}
