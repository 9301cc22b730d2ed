//! Digit recognition for page-number regions.
//!
//! This module provides:
//! - Tesseract discovery (`setup`)
//! - The OCR engine boundary and its Tesseract subprocess implementation (`engine`)
//! - Region normalization before recognition (`preprocess`)
//! - Three-digit label extraction from recognized text (`extract`)

pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use engine::{OcrConfig, OcrEngine, TesseractEngine};
pub use extract::{CandidatePolicy, NumberExtractor};
pub use preprocess::{PreprocessParams, preprocess_region};
pub use setup::{TesseractPaths, ensure_tesseract};
