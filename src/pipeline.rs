//! End-to-end sort of one document: rasterize, order, encode.

use std::path::{Path, PathBuf};

use crate::config::SorterConfig;
use crate::document::{DocumentEncoder, PdfEncoder, PdftoppmRasterizer, Rasterizer};
use crate::error::SortError;
use crate::log;
use crate::ocr::{OcrEngine, TesseractEngine, ensure_tesseract};
use crate::sorting::{DocumentSorter, ManualCorrections, SortOptions, SortReport};

/// Result of a successful run.
#[derive(Debug)]
pub struct SortOutcome {
    /// Path the sorted document was written to
    pub output: PathBuf,
    pub report: SortReport,
}

/// Wires a rasterizer, an OCR engine and an encoder around the document sorter.
pub struct PageSorter<R, E, D> {
    rasterizer: R,
    engine: E,
    encoder: D,
    options: SortOptions,
    dpi: u32,
}

impl PageSorter<PdftoppmRasterizer, TesseractEngine, PdfEncoder> {
    /// Builds the default toolchain (pdftoppm, tesseract, lopdf) from config.
    pub fn from_config(config: &SorterConfig) -> Result<Self, SortError> {
        let rasterizer = PdftoppmRasterizer::locate(config.pdftoppm_path.as_deref())?;
        let paths = ensure_tesseract(
            config.tesseract_path.as_deref(),
            config.tessdata_dir.as_deref(),
        )
        .map_err(|e| SortError::Ocr(e.to_string()))?;

        Ok(Self::new(
            rasterizer,
            TesseractEngine::new(paths),
            PdfEncoder::new(config.dpi, config.jpeg_quality),
            config.sort_options(),
            config.dpi,
        ))
    }
}

impl<R, E, D> PageSorter<R, E, D>
where
    R: Rasterizer,
    E: OcrEngine,
    D: DocumentEncoder,
{
    pub fn new(rasterizer: R, engine: E, encoder: D, options: SortOptions, dpi: u32) -> Self {
        Self {
            rasterizer,
            engine,
            encoder,
            options,
            dpi,
        }
    }

    /// Sorts the pages of `input` and writes them to `output`.
    ///
    /// Nothing is written when the run fails.
    pub fn run(
        &self,
        input: &Path,
        output: &Path,
        corrections: &ManualCorrections,
    ) -> Result<SortOutcome, SortError> {
        if !input.is_file() {
            return Err(SortError::InputNotFound(input.to_path_buf()));
        }

        let images = self.rasterizer.rasterize(input, self.dpi)?;
        if images.is_empty() {
            return Err(SortError::EmptyDocument);
        }
        log(&format!("Sorting {} pages from {}", images.len(), input.display()));
        if !corrections.is_empty() {
            log(&format!("Using {} manual corrections", corrections.len()));
        }

        let sorted = DocumentSorter::new(&self.engine, self.options).sort(images, corrections)?;
        let written = self.encoder.encode(&sorted.pages, output)?;
        sorted.report.log_summary();

        Ok(SortOutcome {
            output: written,
            report: sorted.report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::OcrConfig;
    use crate::sorting::{TRIALS, region::chunk_region};
    use anyhow::Result;
    use image::{GrayImage, Rgb, RgbImage};
    use std::cell::RefCell;
    use std::fs;
    use tempfile::tempdir;

    const PAGE_HEIGHT: u32 = 100;

    struct FixedRasterizer {
        widths: Vec<u32>,
    }

    impl Rasterizer for FixedRasterizer {
        fn rasterize(&self, _input: &Path, _dpi: u32) -> Result<Vec<RgbImage>, SortError> {
            Ok(self
                .widths
                .iter()
                .map(|&w| RgbImage::from_pixel(w, PAGE_HEIGHT, Rgb([255, 255, 255])))
                .collect())
        }
    }

    /// Reads a page's label when that page's bottom-right band is shown.
    struct WidthEngine {
        labels: Vec<(u32, u32)>,
    }

    impl OcrEngine for WidthEngine {
        fn recognize(&self, region: &GrayImage, _config: &OcrConfig) -> Result<String> {
            Ok(self
                .labels
                .iter()
                .find(|(page_width, _)| {
                    let band = chunk_region(*page_width, PAGE_HEIGHT, &TRIALS[0], 0).unwrap();
                    (band.width * 2, band.height * 2) == region.dimensions()
                })
                .map(|(_, label)| label.to_string())
                .unwrap_or_default())
        }
    }

    /// Writes page widths as text so tests can check the order.
    struct RecordingEncoder {
        written: RefCell<Vec<u32>>,
    }

    impl DocumentEncoder for RecordingEncoder {
        fn encode(&self, pages: &[RgbImage], output: &Path) -> Result<PathBuf, SortError> {
            let widths: Vec<u32> = pages.iter().map(|p| p.width()).collect();
            fs::write(output, format!("{:?}", widths)).map_err(|source| SortError::Write {
                path: output.to_path_buf(),
                source,
            })?;
            *self.written.borrow_mut() = widths;
            Ok(output.to_path_buf())
        }
    }

    fn sorter(labels: Vec<(u32, u32)>) -> PageSorter<FixedRasterizer, WidthEngine, RecordingEncoder> {
        PageSorter::new(
            FixedRasterizer {
                widths: labels.iter().map(|(w, _)| *w).collect(),
            },
            WidthEngine { labels },
            RecordingEncoder {
                written: RefCell::new(Vec::new()),
            },
            SortOptions::default(),
            200,
        )
    }

    #[test]
    fn test_run_writes_sorted_pages() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("scan.pdf");
        fs::write(&input, b"%PDF-1.5").unwrap();
        let output = dir.path().join("sorted_scan.pdf");

        let pipeline = sorter(vec![(30, 103), (40, 101), (50, 102)]);
        let outcome = pipeline
            .run(&input, &output, &ManualCorrections::new())
            .unwrap();

        assert_eq!(outcome.output, output);
        assert_eq!(outcome.report.order, vec![1, 2, 0]);
        assert_eq!(*pipeline.encoder.written.borrow(), vec![40, 50, 30]);
    }

    #[test]
    fn test_missing_input_fails_before_rasterizing() {
        let dir = tempdir().unwrap();
        let pipeline = sorter(vec![(30, 103)]);

        let result = pipeline.run(
            &dir.path().join("absent.pdf"),
            &dir.path().join("out.pdf"),
            &ManualCorrections::new(),
        );

        assert!(matches!(result, Err(SortError::InputNotFound(_))));
    }

    #[test]
    fn test_no_labels_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("scan.pdf");
        fs::write(&input, b"%PDF-1.5").unwrap();
        let output = dir.path().join("sorted_scan.pdf");

        let pipeline = sorter(vec![(30, 42), (40, 1234)]);
        let result = pipeline.run(&input, &output, &ManualCorrections::new());

        assert!(matches!(result, Err(SortError::NoLabelsDetected)));
        assert!(!output.exists());
        assert!(pipeline.encoder.written.borrow().is_empty());
    }
}
