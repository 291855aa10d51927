//! docchain CLI
//!
//! Runs configured preprocessor chains over JSON documents.

mod commands;
mod logging;
mod output;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "docchain",
    version,
    about = "docchain - configurable document preprocessing",
    long_about = "Runs a configured chain of document preprocessors over JSON documents.\n\n\
                  Stages are declared in a pipeline configuration file (JSON, YAML or TOML);\n\
                  DOCCHAIN__* environment variables override file values."
)]
struct Cli {
    /// Output format (text, json, yaml)
    #[arg(
        short,
        long,
        global = true,
        default_value = "text",
        value_parser = ["text", "json", "yaml"]
    )]
    format: String,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "DOCCHAIN_LOG", default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process documents through a configured chain
    Run {
        /// Pipeline configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// JSON document or array of documents, `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Documents processed concurrently (overrides configuration)
        #[arg(short, long)]
        parallelism: Option<usize>,

        /// Fail when any document is rejected
        #[arg(long)]
        strict: bool,
    },

    /// Build the configured chain and list its stages
    Validate {
        /// Pipeline configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// List registered stage types
    Stages,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = logging::init(&cli.log_level, cli.json_logs, !cli.no_color) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        return ExitCode::FAILURE;
    }

    let format: OutputFormat = match cli.format.parse() {
        Ok(format) => format,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Run {
            config,
            input,
            parallelism,
            strict,
        } => commands::run::run(&config, &input, parallelism, strict, format).await,
        Commands::Validate { config } => commands::validate::run(&config, format),
        Commands::Stages => commands::stages::run(format),
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            if cli.verbose {
                for cause in e.chain().skip(1) {
                    eprintln!("{}: {}", "Caused by".yellow(), cause);
                }
            }
            ExitCode::FAILURE
        }
    }
}
