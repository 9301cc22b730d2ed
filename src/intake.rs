//! Checks applied to an input document before it reaches the sorter.
//!
//! These live at the boundary where a document is handed in (the CLI here, an
//! upload endpoint elsewhere): size ceiling, extension allow-list, filename
//! sanitizing and the name of the produced artifact.

use std::fs;
use std::path::Path;

use crate::error::SortError;

/// Fallback used when sanitizing leaves nothing usable.
const DEFAULT_FILENAME: &str = "document.pdf";

/// Limits for accepted input documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakePolicy {
    pub max_bytes: u64,
    /// Lowercase, without the leading dot
    pub allowed_extensions: Vec<String>,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            max_bytes: 50 * 1024 * 1024,
            allowed_extensions: vec!["pdf".to_string()],
        }
    }
}

impl IntakePolicy {
    pub fn allows_extension(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => self
                .allowed_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}

/// Verifies that `path` is an existing file within the policy's limits.
pub fn validate_upload(path: &Path, policy: &IntakePolicy) -> Result<(), SortError> {
    let metadata = match fs::metadata(path) {
        Ok(m) if m.is_file() => m,
        _ => return Err(SortError::InputNotFound(path.to_path_buf())),
    };

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if !policy.allows_extension(&filename) {
        return Err(SortError::InvalidUpload(format!(
            "unsupported file type '{}'; allowed: {}",
            filename,
            policy.allowed_extensions.join(", ")
        )));
    }

    if metadata.len() > policy.max_bytes {
        return Err(SortError::InvalidUpload(format!(
            "{} is {} bytes, limit is {} bytes",
            filename,
            metadata.len(),
            policy.max_bytes
        )));
    }

    Ok(())
}

/// Reduces a caller-supplied filename to a safe single path component.
///
/// Directory parts are dropped, whitespace becomes `_`, anything other than
/// ASCII alphanumerics, `.`, `-` and `_` is removed, and leading dots are
/// stripped so the result can never be hidden or climb directories.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");

    let cleaned: String = base
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                Some(c)
            } else {
                None
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']).trim_end_matches(['.', '_']);

    if cleaned.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Name of the artifact returned for an input document.
pub fn sorted_output_name(name: &str) -> String {
    format!("sorted_{}", sanitize_filename(name))
}
