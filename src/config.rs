//! Sorter configuration loaded from config.json.
//!
//! The configuration is read once at startup and passed down explicitly as an
//! immutable value. A missing or broken file falls back to the defaults, which
//! reproduce the reference scan parameters (200 DPI, 2x upscale, contrast 2.0,
//! threshold 150, largest candidate wins, three retry passes).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::intake::IntakePolicy;
use crate::ocr::extract::CandidatePolicy;
use crate::ocr::preprocess::{MAX_UPSCALE, PreprocessParams};
use crate::sorting::SortOptions;

/// Complete sorter configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SorterConfig {
    /// Rasterization resolution, also used to size output pages
    pub dpi: u32,
    /// Upscale factor applied to each candidate region before OCR
    pub upscale_factor: u32,
    /// Multiplicative contrast factor (1.0 = unchanged)
    pub contrast_factor: f32,
    /// Pixels darker than this become black, everything else white
    pub binarize_threshold: u8,
    /// Which candidate wins when one OCR pass yields several numbers
    pub candidate_policy: CandidatePolicy,
    /// Extra passes over unlabeled pages, each with a different scan tier
    pub retry_passes: usize,
    /// Pages resolved concurrently (1 = sequential)
    pub workers: usize,
    /// Explicit tesseract executable, otherwise searched on PATH
    pub tesseract_path: Option<PathBuf>,
    /// Explicit tessdata directory, otherwise TESSDATA_PREFIX or the engine default
    pub tessdata_dir: Option<PathBuf>,
    /// Explicit pdftoppm executable, otherwise searched on PATH
    pub pdftoppm_path: Option<PathBuf>,
    /// Upper bound for accepted input documents
    pub max_upload_bytes: u64,
    /// Accepted input extensions, lowercase without the dot
    pub allowed_extensions: Vec<String>,
    /// JPEG quality for pages embedded in the output PDF
    pub jpeg_quality: u8,
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            upscale_factor: 2,
            contrast_factor: 2.0,
            binarize_threshold: 150,
            candidate_policy: CandidatePolicy::Max,
            retry_passes: 3,
            workers: 1,
            tesseract_path: None,
            tessdata_dir: None,
            pdftoppm_path: None,
            max_upload_bytes: 50 * 1024 * 1024,
            allowed_extensions: vec!["pdf".to_string()],
            jpeg_quality: 90,
        }
    }
}

impl SorterConfig {
    /// Preprocessing parameters for the first scan pass.
    pub fn preprocess_params(&self) -> PreprocessParams {
        PreprocessParams {
            upscale: self.upscale_factor.clamp(1, MAX_UPSCALE),
            contrast: self.contrast_factor,
            threshold: self.binarize_threshold,
        }
    }

    /// Options for the document sorter.
    pub fn sort_options(&self) -> SortOptions {
        SortOptions {
            base: self.preprocess_params(),
            policy: self.candidate_policy,
            retry_passes: self.retry_passes,
            workers: self.workers.max(1),
        }
    }

    /// Limits applied to an input document before it reaches the sorter.
    pub fn intake_policy(&self) -> IntakePolicy {
        IntakePolicy {
            max_bytes: self.max_upload_bytes,
            allowed_extensions: self
                .allowed_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }
}

/// Loads configuration from `path`, or from the default locations when `path`
/// is None: config.json next to the executable, then the per-user config dir.
///
/// Any read or parse failure is logged and the defaults are returned.
pub fn load_config(path: Option<&Path>) -> SorterConfig {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let exe_config = crate::paths::get_default_config_path();
            match crate::paths::get_user_config_path() {
                Some(user_config) if !exe_config.exists() && user_config.exists() => user_config,
                _ => exe_config,
            }
        }
    };

    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(&config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read {}: {}. Using defaults.",
                    config_path.display(),
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    SorterConfig::default()
}
