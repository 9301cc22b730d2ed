//! Page Sorter
//!
//! Recovers the reading order of a scanned document whose pages carry a printed
//! three-digit page number. Each page is rasterized, its footer area is searched
//! with Tesseract OCR, and the pages are written back out in ascending label
//! order with unlabeled pages appended at the end.

pub mod config;
pub mod document;
pub mod error;
pub mod intake;
pub mod ocr;
pub mod paths;
pub mod pipeline;
pub mod sorting;

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

pub use config::SorterConfig;
pub use error::SortError;
pub use pipeline::{PageSorter, SortOutcome};
pub use sorting::{ManualCorrections, SortReport};

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("page_sorter.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

/// Sorts `input` into `output` using the tools named in `config`.
///
/// Fails fast with `InputNotFound` before any external tool is located.
pub fn sort_document(
    input: &Path,
    output: &Path,
    corrections: &ManualCorrections,
    config: &SorterConfig,
) -> Result<SortOutcome, SortError> {
    if !input.is_file() {
        return Err(SortError::InputNotFound(input.to_path_buf()));
    }
    PageSorter::from_config(config)?.run(input, output, corrections)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_document_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.pdf");
        let output = dir.path().join("absent_sorted.pdf");

        let result = sort_document(
            &missing,
            &output,
            &ManualCorrections::default(),
            &SorterConfig::default(),
        );

        assert!(matches!(result, Err(SortError::InputNotFound(p)) if p == missing));
        assert!(!output.exists());
    }
}
