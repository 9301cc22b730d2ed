//! Whole-document ordering.
//!
//! Pass 1 resolves every page. If no page produced a label the run is aborted.
//! Unlabeled pages then get up to three retry passes, each on a stronger
//! [`ScanTier`]. The final order is every label group in ascending label order,
//! followed by the still unlabeled pages in their original order.

use image::RgbImage;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::channel;
use std::thread;

use crate::error::SortError;
use crate::log;
use crate::ocr::engine::OcrEngine;
use crate::ocr::extract::{CandidatePolicy, NumberExtractor};
use crate::ocr::preprocess::PreprocessParams;

use super::page::{ManualCorrections, Page};
use super::resolver::{PageLabelResolver, RETRY_TIER_COUNT, Resolution, ScanTier};

/// Tunables for a sort run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SortOptions {
    /// Preprocessing of the first pass
    pub base: PreprocessParams,
    pub policy: CandidatePolicy,
    /// Retry passes over unlabeled pages, capped at the number of retry tiers
    pub retry_passes: usize,
    /// Pages resolved concurrently within a pass
    pub workers: usize,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            base: PreprocessParams::default(),
            policy: CandidatePolicy::Max,
            retry_passes: RETRY_TIER_COUNT,
            workers: 1,
        }
    }
}

/// Page indices grouped by label. Indices within a group stay in ascending
/// original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageGroups {
    groups: BTreeMap<u16, Vec<usize>>,
}

impl PageGroups {
    pub fn insert(&mut self, label: u16, index: usize) {
        let group = self.groups.entry(label).or_default();
        let pos = group.partition_point(|&existing| existing <= index);
        group.insert(pos, index);
    }

    pub fn get(&self, label: u16) -> Option<&[usize]> {
        self.groups.get(&label).map(|g| g.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Number of pages across all groups.
    pub fn page_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn has_duplicates(&self) -> bool {
        self.groups.values().any(|g| g.len() > 1)
    }

    /// All grouped indices, ascending by label.
    pub fn ordered_indices(&self) -> Vec<usize> {
        self.groups.values().flatten().copied().collect()
    }
}

/// What a sort run decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortReport {
    pub total_pages: usize,
    /// Recovered label per original page index
    pub labels: Vec<Option<u16>>,
    pub groups: PageGroups,
    /// Pages without a label, ascending original index
    pub unlabeled: Vec<usize>,
    /// Final order as original indices
    pub order: Vec<usize>,
    /// Passes actually run, including the first
    pub passes: usize,
}

impl SortReport {
    pub fn labeled_count(&self) -> usize {
        self.groups.page_count()
    }

    pub fn unlabeled_count(&self) -> usize {
        self.unlabeled.len()
    }

    pub fn log_summary(&self) {
        log("--- Summary ---");
        log(&format!("Total pages:               {}", self.total_pages));
        log(&format!("Pages sorted by number:    {}", self.labeled_count()));
        log(&format!("Pages unsorted (appended): {}", self.unlabeled_count()));
        if self.groups.has_duplicates() {
            log("Duplicate numbers were grouped together.");
        }
    }
}

/// Sorted pages plus the report that produced their order.
#[derive(Debug)]
pub struct SortedDocument {
    pub pages: Vec<RgbImage>,
    pub report: SortReport,
}

pub struct DocumentSorter<'a, E: OcrEngine> {
    engine: &'a E,
    options: SortOptions,
}

impl<'a, E: OcrEngine> DocumentSorter<'a, E> {
    pub fn new(engine: &'a E, options: SortOptions) -> Self {
        Self { engine, options }
    }

    /// Orders `images` by their recovered page labels.
    ///
    /// Fails with `NoLabelsDetected` when the first pass labels nothing.
    pub fn sort(
        &self,
        images: Vec<RgbImage>,
        corrections: &ManualCorrections,
    ) -> Result<SortedDocument, SortError> {
        if images.is_empty() {
            return Err(SortError::EmptyDocument);
        }

        let extractor = NumberExtractor::new(self.options.policy)
            .map_err(|e| SortError::Config(e.to_string()))?;
        let resolver = PageLabelResolver::new(self.engine, &extractor, corrections);
        let mut pages: Vec<Page> = images
            .into_iter()
            .enumerate()
            .map(|(index, image)| Page::new(index, image))
            .collect();

        let mut groups = PageGroups::default();
        let mut pending: Vec<usize> = Vec::new();

        log("Scanning pages for three-digit numbers...");
        let all: Vec<usize> = (0..pages.len()).collect();
        let base = ScanTier::base(self.options.base);
        for (index, resolution) in self.resolve_batch(&resolver, &pages, &all, &base) {
            match resolution.label() {
                Some(label) => {
                    log(&format!("Page {}: detected #{}", index + 1, label));
                    pages[index].label = Some(label);
                    groups.insert(label, index);
                }
                None => {
                    log(&format!("Page {}: no three-digit number found.", index + 1));
                    pending.push(index);
                }
            }
        }

        if groups.is_empty() {
            return Err(SortError::NoLabelsDetected);
        }

        let mut passes = 1;
        for tier in ScanTier::retry_tiers(self.options.base)
            .iter()
            .take(self.options.retry_passes)
        {
            if pending.is_empty() {
                break;
            }
            passes += 1;
            log(&format!(
                "Retry pass #{} ({}) on {} undetected pages...",
                passes - 1,
                tier.name,
                pending.len()
            ));

            let mut still_pending = Vec::with_capacity(pending.len());
            for (index, resolution) in self.resolve_batch(&resolver, &pages, &pending, tier) {
                match resolution.label() {
                    Some(label) => {
                        log(&format!("Page {}: finally detected #{}", index + 1, label));
                        pages[index].label = Some(label);
                        groups.insert(label, index);
                    }
                    None => still_pending.push(index),
                }
            }
            pending = still_pending;
        }

        let mut order = groups.ordered_indices();
        order.extend(pending.iter().copied());

        let report = SortReport {
            total_pages: pages.len(),
            labels: pages.iter().map(|p| p.label).collect(),
            groups,
            unlabeled: pending,
            order,
            passes,
        };

        let mut slots: Vec<Option<RgbImage>> = pages.into_iter().map(|p| Some(p.image)).collect();
        let sorted = report
            .order
            .iter()
            .filter_map(|&index| slots[index].take())
            .collect();

        Ok(SortedDocument {
            pages: sorted,
            report,
        })
    }

    /// Resolves `indices` under `tier`, returning results in ascending index
    /// order regardless of how many workers ran.
    fn resolve_batch(
        &self,
        resolver: &PageLabelResolver<'_, E>,
        pages: &[Page],
        indices: &[usize],
        tier: &ScanTier,
    ) -> Vec<(usize, Resolution)> {
        let workers = self.options.workers.min(indices.len());
        if workers <= 1 {
            return indices
                .iter()
                .map(|&index| (index, resolver.resolve(&pages[index], tier)))
                .collect();
        }

        let next = AtomicUsize::new(0);
        let (sender, receiver) = channel();

        thread::scope(|scope| {
            for _ in 0..workers {
                let sender = sender.clone();
                let next = &next;
                scope.spawn(move || {
                    loop {
                        let slot = next.fetch_add(1, Ordering::SeqCst);
                        let Some(&index) = indices.get(slot) else {
                            break;
                        };
                        let resolution = resolver.resolve(&pages[index], tier);
                        if sender.send((index, resolution)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(sender);

        let mut results: Vec<(usize, Resolution)> = receiver.iter().collect();
        results.sort_by_key(|(index, _)| *index);
        results
    }
}
