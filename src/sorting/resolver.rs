//! Per-page label detection.
//!
//! A page is scanned region by region (see [`regions_for`]) and each region is
//! recognized under every OCR mode of the active [`ScanTier`]. The first
//! plausible label wins. When nothing is found the caller's manual correction
//! for that page, if any, is used instead.

use crate::log;
use crate::ocr::engine::{OcrConfig, OcrEngine};
use crate::ocr::extract::NumberExtractor;
use crate::ocr::preprocess::{PreprocessParams, preprocess_region};

use super::page::{ManualCorrections, Page};
use super::region::{crop_chunk, regions_for};

/// Preprocessing and OCR modes used for one pass over a page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanTier {
    pub name: &'static str,
    pub preprocess: PreprocessParams,
    pub ocr_configs: [OcrConfig; 2],
}

impl ScanTier {
    /// First pass: block and automatic segmentation on the configured preprocessing.
    pub fn base(preprocess: PreprocessParams) -> Self {
        Self {
            name: "base",
            preprocess,
            ocr_configs: [OcrConfig::BLOCK, OcrConfig::AUTO],
        }
    }
}

/// Number of escalation tiers available to retry passes.
pub const RETRY_TIER_COUNT: usize = 3;

impl ScanTier {
    /// Escalation used by retry passes, in order. Upscale, threshold and OCR
    /// modes change per tier; the contrast factor follows `base`.
    pub fn retry_tiers(base: PreprocessParams) -> [ScanTier; RETRY_TIER_COUNT] {
        let with = |upscale: u32, threshold: u8| PreprocessParams {
            upscale,
            threshold,
            ..base
        };
        [
            ScanTier {
                name: "upscale-3x",
                preprocess: with(3, 150),
                ocr_configs: [OcrConfig::LINE, OcrConfig::SPARSE],
            },
            ScanTier {
                name: "faint-print",
                preprocess: with(2, 180),
                ocr_configs: [OcrConfig::BLOCK, OcrConfig::SPARSE],
            },
            ScanTier {
                name: "heavy-print",
                preprocess: with(4, 120),
                ocr_configs: [OcrConfig::LINE, OcrConfig::RAW_LINE],
            },
        ]
    }
}

/// Where a detected label came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelSource {
    Ocr {
        trial: usize,
        chunk: usize,
        config: usize,
    },
    Manual,
}

/// Outcome of one resolution attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Detected { label: u16, source: LabelSource },
    /// Every region and mode was tried without a plausible label
    Exhausted,
}

impl Resolution {
    pub fn label(&self) -> Option<u16> {
        match self {
            Resolution::Detected { label, .. } => Some(*label),
            Resolution::Exhausted => None,
        }
    }
}

pub struct PageLabelResolver<'a, E: OcrEngine> {
    engine: &'a E,
    extractor: &'a NumberExtractor,
    corrections: &'a ManualCorrections,
}

impl<'a, E: OcrEngine> PageLabelResolver<'a, E> {
    pub fn new(
        engine: &'a E,
        extractor: &'a NumberExtractor,
        corrections: &'a ManualCorrections,
    ) -> Self {
        Self {
            engine,
            extractor,
            corrections,
        }
    }

    /// Scans `page` under `tier`, stopping at the first plausible label.
    ///
    /// OCR invocation errors only disqualify the region/mode they occurred on.
    pub fn resolve(&self, page: &Page, tier: &ScanTier) -> Resolution {
        let (width, height) = page.image.dimensions();

        for candidate in regions_for(width, height) {
            let chunk = crop_chunk(&page.image, &candidate.region);
            let processed = preprocess_region(&chunk, &tier.preprocess);

            for (config_idx, config) in tier.ocr_configs.iter().enumerate() {
                let text = match self.engine.recognize(&processed, config) {
                    Ok(text) => text,
                    Err(e) => {
                        log(&format!(
                            "Page {}: OCR failed on trial {} chunk {} ({}): {}",
                            page.index + 1,
                            candidate.trial + 1,
                            candidate.chunk + 1,
                            config,
                            e
                        ));
                        continue;
                    }
                };

                if let Some(label) = self.extractor.extract(&text) {
                    return Resolution::Detected {
                        label,
                        source: LabelSource::Ocr {
                            trial: candidate.trial,
                            chunk: candidate.chunk,
                            config: config_idx,
                        },
                    };
                }
            }
        }

        match self.corrections.get(page.index) {
            Some(label) => Resolution::Detected {
                label,
                source: LabelSource::Manual,
            },
            None => Resolution::Exhausted,
        }
    }
}
