//! Fatal error kinds surfaced to callers of the sorting pipeline.
//!
//! Per-page detection failures never show up here: they are routed to the
//! unsorted tail and only counted in the [`SortReport`](crate::SortReport).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SortError {
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Failed to rasterize document: {0}")]
    Rasterize(String),

    #[error("Document has no pages")]
    EmptyDocument,

    #[error("No three-digit page numbers detected on any page")]
    NoLabelsDetected,

    #[error("OCR engine unavailable: {0}")]
    Ocr(String),

    #[error("Failed to encode output document: {0}")]
    Encoding(String),

    #[error("Failed to write {}: {}", path.display(), source)]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rejected input: {0}")]
    InvalidUpload(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SortError {
    /// True when the failure was caused by the caller's input rather than by
    /// this process or its collaborators.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SortError::InputNotFound(_)
                | SortError::EmptyDocument
                | SortError::NoLabelsDetected
                | SortError::InvalidUpload(_)
                | SortError::Config(_)
        )
    }
}
