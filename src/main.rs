//! Page Sorter
//!
//! Command-line front end: validates the input document, loads configuration
//! and manual corrections, then writes a copy of the document with its pages
//! reordered by their printed three-digit page numbers.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use page_sorter::config::load_config;
use page_sorter::intake::{sorted_output_name, validate_upload};
use page_sorter::ocr::CandidatePolicy;
use page_sorter::{ManualCorrections, SortError, log, paths, sort_document};

#[derive(Parser, Debug)]
#[command(name = "page-sorter", version, about = "Reorder scanned pages by their printed page numbers")]
struct Cli {
    /// Input PDF
    input: PathBuf,

    /// Output PDF (default: <exe_dir>/sorted/sorted_<input name>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (default: config.json next to the executable)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file mapping page indices to labels, e.g. {"0": 100}
    #[arg(long)]
    corrections: Option<PathBuf>,

    /// Forced label for a page index, e.g. --correct 3=120 (repeatable)
    #[arg(long = "correct", value_name = "INDEX=LABEL")]
    correct: Vec<String>,

    /// Pages resolved concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Candidate choice when a region reads several numbers
    #[arg(long, value_parser = clap::value_parser!(CandidatePolicy))]
    policy: Option<CandidatePolicy>,
}

fn main() -> ExitCode {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    let cli = Cli::parse();

    if let Err(e) = paths::ensure_directories() {
        eprintln!("Warning: failed to create output directories: {}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log(&format!("ERROR: {}", e));
            match e.downcast_ref::<SortError>() {
                Some(sort_error) if sort_error.is_client_error() => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref());
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(policy) = cli.policy {
        config.candidate_policy = policy;
    }

    let mut corrections = match &cli.corrections {
        Some(path) => ManualCorrections::from_file(path)?,
        None => ManualCorrections::new(),
    };
    for assignment in &cli.correct {
        corrections.insert_assignment(assignment)?;
    }

    validate_upload(&cli.input, &config.intake_policy())?;

    let output = match cli.output {
        Some(path) => path,
        None => {
            let name = cli
                .input
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            paths::get_sorted_dir().join(sorted_output_name(&name))
        }
    };

    let outcome = sort_document(&cli.input, &output, &corrections, &config)?;

    log(&format!(
        "Done: {} ({} of {} pages labeled)",
        outcome.output.display(),
        outcome.report.labeled_count(),
        outcome.report.total_pages
    ));
    Ok(())
}
