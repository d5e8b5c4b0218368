//! Command-line loader for mind-map documents.
//!
//! # Responsibility
//! - Load one `.xmind` file through `mindmap_core` and print a summary.
//! - Optionally dump the load report or the canonical document as JSON.

use clap::Parser;
use log::warn;
use mindmap_core::{default_log_level, init_logging, DocumentLoader, LoaderConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "mindmap_cli")]
#[command(about = "Load a mind-map document and print its structure")]
#[command(version)]
struct Cli {
    /// Path to the `.xmind` document
    path: PathBuf,

    /// Print the per-load diagnostic report
    #[arg(long)]
    debug: bool,

    /// Print the canonical document as JSON
    #[arg(long)]
    json: bool,

    /// Maximum number of cached documents; 0 disables caching
    #[arg(long, default_value_t = mindmap_core::DEFAULT_CACHE_CAPACITY)]
    cache_capacity: usize,

    /// Directory for rolling log files; logging stays off when omitted
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = start_logging(level, log_dir) {
            eprintln!("warning: {err}");
        }
    }

    let loader = DocumentLoader::new(LoaderConfig {
        cache_capacity: cli.cache_capacity,
        debug: cli.debug,
    });

    let outcome = match loader.load_with_report(&cli.path) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let stats = outcome.document.stats();
    println!("sheets={}", stats.sheet_count);
    println!("topics={}", stats.topic_count);
    println!("max_depth={}", stats.max_depth);

    if let Some(report) = outcome.report.as_ref() {
        match serde_json::to_string_pretty(report) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => warn!("event=cli_report module=cli status=error error={err}"),
        }
    }

    if cli.json {
        match serde_json::to_string_pretty(outcome.document.as_ref()) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => {
                eprintln!("error: cannot render document: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

fn start_logging(level: &str, log_dir: &Path) -> Result<(), String> {
    // Why: `init_logging` rejects relative paths; resolve them against the
    // working directory the user typed them in.
    let log_dir = if log_dir.is_absolute() {
        log_dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|err| format!("cannot resolve log directory: {err}"))?
            .join(log_dir)
    };
    init_logging(level, &log_dir).map_err(|err| err.to_string())
}
