use anyhow::{Context, Result, anyhow};
use image::GrayImage;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::TesseractPaths;

/// Characters Tesseract is allowed to emit for page-number regions.
pub const DIGIT_WHITELIST: &str = "0123456789";

/// One recognition mode: a Tesseract page segmentation mode restricted to digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrConfig {
    pub psm: u8,
}

impl OcrConfig {
    /// Single uniform block of text
    pub const BLOCK: OcrConfig = OcrConfig::digits(6);
    /// Fully automatic page segmentation
    pub const AUTO: OcrConfig = OcrConfig::digits(3);
    /// Single text line
    pub const LINE: OcrConfig = OcrConfig::digits(7);
    /// Sparse text, as much as possible in no particular order
    pub const SPARSE: OcrConfig = OcrConfig::digits(11);
    /// Raw line, bypassing Tesseract-specific layout hacks
    pub const RAW_LINE: OcrConfig = OcrConfig::digits(13);

    pub const fn digits(psm: u8) -> Self {
        Self { psm }
    }

    /// Command-line arguments passed to the tesseract executable.
    pub fn args(&self) -> Vec<String> {
        vec![
            "--psm".to_string(),
            self.psm.to_string(),
            "-c".to_string(),
            format!("tessedit_char_whitelist={}", DIGIT_WHITELIST),
        ]
    }
}

impl fmt::Display for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args().join(" "))
    }
}

/// Text recognition as a black box: binarized region + mode → raw text.
///
/// Implementations must be shareable across worker threads.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, region: &GrayImage, config: &OcrConfig) -> Result<String>;
}

/// Runs the tesseract executable once per region.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
}

impl TesseractEngine {
    pub fn new(paths: TesseractPaths) -> Self {
        Self {
            executable: paths.executable,
            tessdata: paths.tessdata,
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, region: &GrayImage, config: &OcrConfig) -> Result<String> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        region
            .save(temp_input.path())
            .context("Failed to write OCR input image")?;

        let mut command = Command::new(&self.executable);
        command.arg(temp_input.path()).arg("stdout");
        if let Some(tessdata) = &self.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        let output = command.args(config.args()).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_args_restrict_to_digits() {
        assert_eq!(
            OcrConfig::BLOCK.to_string(),
            "--psm 6 -c tessedit_char_whitelist=0123456789"
        );
        assert_eq!(
            OcrConfig::AUTO.to_string(),
            "--psm 3 -c tessedit_char_whitelist=0123456789"
        );
    }

    #[test]
    fn test_missing_executable_is_an_error() {
        let engine = TesseractEngine::new(TesseractPaths {
            executable: PathBuf::from("/nonexistent/tesseract-binary"),
            tessdata: None,
        });
        let region = GrayImage::from_pixel(4, 4, image::Luma([255]));
        assert!(engine.recognize(&region, &OcrConfig::BLOCK).is_err());
    }
}
