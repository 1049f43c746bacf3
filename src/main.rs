use std::fs;
use std::path::{Path, PathBuf};
use std::process::exit;

use anyhow::{Context, Result};
use clap::Parser;

use compendium_ingest::config::IngestConfig;
use compendium_ingest::ingestion::{
    import_directory_with, import_file_with, ImportOptions, ImportReport, ParsedDocument,
};
use compendium_ingest::logging;

/// Import compendium XML files and write their records as JSON.
#[derive(Parser, Debug)]
#[command(name = "compendium-ingest", version, about)]
struct Cli {
    /// Compendium file or directory of files
    path: PathBuf,

    /// Output directory (default: the configured output directory)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Configuration file (default: the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Parse files one at a time instead of on the thread pool
    #[arg(long)]
    sequential: bool,

    /// Print the import report as JSON instead of a summary line
    #[arg(long)]
    report: bool,
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(report) if report.failed() == 0 => {}
        Ok(_) => exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit(2);
        }
    }
}

fn run(cli: Cli) -> Result<ImportReport> {
    let config = match &cli.config {
        Some(path) => IngestConfig::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => IngestConfig::load(),
    };
    let _log_guard = logging::init(&config);
    log::info!("{} v{} starting", compendium_ingest::NAME, compendium_ingest::VERSION);

    let mut options = ImportOptions::from(config.import.clone());
    if cli.sequential {
        options.parallel = false;
    }

    let out_dir = cli.out.clone().unwrap_or_else(|| config.output_dir());
    let input_root = if cli.path.is_dir() {
        cli.path.as_path()
    } else {
        cli.path.parent().unwrap_or(Path::new(""))
    };
    let sink = |path: &Path, document: &ParsedDocument| write_document(path, document, input_root, &out_dir);

    let report = if cli.path.is_dir() {
        import_directory_with(&cli.path, &options, sink)
    } else {
        ImportReport {
            files: vec![import_file_with(&cli.path, &sink)],
        }
    };

    if cli.report {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serializing import report")?
        );
    } else {
        println!(
            "{} files, {} records, {} failed -> {}",
            report.files.len(),
            report.total_records(),
            report.failed(),
            out_dir.display()
        );
        for failure in report.files.iter().filter(|f| !f.is_success()) {
            eprintln!(
                "  {}: {}",
                failure.path.display(),
                failure.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(report)
}

/// Write one document as `<out_dir>/<relative input path>.json`.
fn write_document(
    path: &Path,
    document: &ParsedDocument,
    input_root: &Path,
    out_dir: &Path,
) -> compendium_ingest::Result<()> {
    let relative = path.strip_prefix(input_root).unwrap_or(path);
    let target = out_dir.join(relative).with_extension("json");
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(document)?;
    fs::write(&target, json)?;
    log::debug!("Wrote {}", target.display());
    Ok(())
}
