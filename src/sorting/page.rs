//! Page records and caller-supplied label corrections.

use image::RgbImage;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::SortError;
use crate::ocr::extract::is_plausible_label;

/// One rasterized input page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Position in the input document (0-based)
    pub index: usize,
    pub image: RgbImage,
    /// Recovered label, written once by the sorter
    pub label: Option<u16>,
}

impl Page {
    pub fn new(index: usize, image: RgbImage) -> Self {
        Self {
            index,
            image,
            label: None,
        }
    }
}

/// Forced labels by page index, used only after automated detection fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualCorrections {
    labels: BTreeMap<usize, u16>,
}

impl ManualCorrections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a correction. Labels outside 100..=999 are rejected.
    pub fn insert(&mut self, index: usize, label: u32) -> Result<(), SortError> {
        if !is_plausible_label(label) {
            return Err(SortError::Config(format!(
                "correction for page index {} must be a three-digit label, got {}",
                index, label
            )));
        }
        self.labels.insert(index, label as u16);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<u16> {
        self.labels.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Parses a JSON object mapping page indices to labels: `{"0": 100, "7": 152}`.
    pub fn from_json_str(json: &str) -> Result<Self, SortError> {
        let raw: BTreeMap<String, u32> = serde_json::from_str(json)
            .map_err(|e| SortError::Config(format!("invalid corrections JSON: {}", e)))?;

        let mut corrections = Self::new();
        for (key, label) in raw {
            let index = key.trim().parse::<usize>().map_err(|_| {
                SortError::Config(format!("correction key '{}' is not a page index", key))
            })?;
            corrections.insert(index, label)?;
        }
        Ok(corrections)
    }

    /// Reads a corrections JSON file.
    pub fn from_file(path: &Path) -> Result<Self, SortError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            SortError::Config(format!(
                "failed to read corrections {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&contents)
    }

    /// Parses one `INDEX=LABEL` assignment and adds it.
    pub fn insert_assignment(&mut self, assignment: &str) -> Result<(), SortError> {
        let invalid = || {
            SortError::Config(format!(
                "correction '{}' must look like INDEX=LABEL",
                assignment
            ))
        };
        let (index, label) = assignment.split_once('=').ok_or_else(invalid)?;
        let index = index.trim().parse::<usize>().map_err(|_| invalid())?;
        let label = label.trim().parse::<u32>().map_err(|_| invalid())?;
        self.insert(index, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_corrections_from_json() {
        let corrections = ManualCorrections::from_json_str(r#"{"0": 100, "7": 152}"#).unwrap();
        assert_eq!(corrections.len(), 2);
        assert_eq!(corrections.get(0), Some(100));
        assert_eq!(corrections.get(7), Some(152));
        assert_eq!(corrections.get(1), None);
    }

    #[test]
    fn test_corrections_reject_bad_input() {
        assert!(ManualCorrections::from_json_str(r#"{"0": 99}"#).is_err());
        assert!(ManualCorrections::from_json_str(r#"{"first": 100}"#).is_err());
        assert!(ManualCorrections::from_json_str("[100]").is_err());
    }

    #[test]
    fn test_insert_assignment() {
        let mut corrections = ManualCorrections::new();
        corrections.insert_assignment("3=120").unwrap();
        corrections.insert_assignment(" 4 = 121 ").unwrap();
        assert_eq!(corrections.get(3), Some(120));
        assert_eq!(corrections.get(4), Some(121));

        assert!(corrections.insert_assignment("3").is_err());
        assert!(corrections.insert_assignment("x=120").is_err());
        assert!(corrections.insert_assignment("3=1200").is_err());
    }

    #[test]
    fn test_corrections_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrections.json");
        fs::write(&path, r#"{"2": 300}"#).unwrap();

        let corrections = ManualCorrections::from_file(&path).unwrap();
        assert_eq!(corrections.get(2), Some(300));
        assert!(ManualCorrections::from_file(&dir.path().join("missing.json")).is_err());
    }
}
