use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A standalone run of exactly three digits. Word boundaries keep runs that
/// are part of longer numbers (e.g. "1234") from matching.
const LABEL_PATTERN: &str = r"\b(\d{3})\b";

/// Smallest and largest accepted page label.
pub const MIN_LABEL: u16 = 100;
pub const MAX_LABEL: u16 = 999;

/// Returns true if `value` is a plausible three-digit page label.
pub fn is_plausible_label(value: u32) -> bool {
    (MIN_LABEL as u32..=MAX_LABEL as u32).contains(&value)
}

/// How to choose between several plausible candidates found in one OCR pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidatePolicy {
    /// Largest value wins; OCR artifacts tend to read as small numbers
    #[default]
    Max,
    /// Smallest value wins
    Min,
    /// First value in reading order wins
    First,
    /// Last value in reading order wins
    Last,
}

impl CandidatePolicy {
    pub fn pick(&self, candidates: &[u16]) -> Option<u16> {
        match self {
            CandidatePolicy::Max => candidates.iter().copied().max(),
            CandidatePolicy::Min => candidates.iter().copied().min(),
            CandidatePolicy::First => candidates.first().copied(),
            CandidatePolicy::Last => candidates.last().copied(),
        }
    }
}

impl std::str::FromStr for CandidatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "max" => Ok(CandidatePolicy::Max),
            "min" => Ok(CandidatePolicy::Min),
            "first" => Ok(CandidatePolicy::First),
            "last" => Ok(CandidatePolicy::Last),
            other => Err(format!(
                "unknown candidate policy '{}' (expected max, min, first or last)",
                other
            )),
        }
    }
}

/// Parses page-label candidates out of raw OCR text.
#[derive(Debug, Clone)]
pub struct NumberExtractor {
    pattern: Regex,
    policy: CandidatePolicy,
}

impl NumberExtractor {
    pub fn new(policy: CandidatePolicy) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(LABEL_PATTERN)?,
            policy,
        })
    }

    /// All plausible labels in reading order, duplicates kept.
    pub fn find_candidates(&self, text: &str) -> Vec<u16> {
        self.pattern
            .captures_iter(text.trim())
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| m.as_str().parse::<u32>().ok())
            .filter(|&n| is_plausible_label(n))
            .map(|n| n as u16)
            .collect()
    }

    /// The label chosen by the configured policy, or None when the text holds
    /// no plausible candidate.
    pub fn extract(&self, text: &str) -> Option<u16> {
        self.policy.pick(&self.find_candidates(text))
    }
}
