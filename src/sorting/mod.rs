//! Page-label detection and document ordering.
//!
//! This module provides:
//! - Candidate region geometry (`region`)
//! - Page records and manual corrections (`page`)
//! - Per-page label resolution across scan tiers (`resolver`)
//! - Grouping, retries and final ordering (`sorter`)

pub mod page;
pub mod region;
pub mod resolver;
pub mod sorter;

pub use page::{ManualCorrections, Page};
pub use region::{Region, TRIALS, TrialConfig};
pub use resolver::{LabelSource, PageLabelResolver, RETRY_TIER_COUNT, Resolution, ScanTier};
pub use sorter::{DocumentSorter, PageGroups, SortOptions, SortReport, SortedDocument};
