use image::RgbImage;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::SortError;
use crate::log;
use crate::ocr::setup::responds_to;

/// Turns a multi-page document into one image per page, in page order.
pub trait Rasterizer {
    fn rasterize(&self, input: &Path, dpi: u32) -> Result<Vec<RgbImage>, SortError>;
}

/// Common install locations checked when pdftoppm is not on PATH.
const COMMON_PDFTOPPM_PATHS: &[&str] = &[
    "/usr/bin/pdftoppm",
    "/usr/local/bin/pdftoppm",
    "/opt/homebrew/bin/pdftoppm",
    r"C:\Program Files\poppler\Library\bin\pdftoppm.exe",
];

/// Rasterizes PDFs with poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    executable: PathBuf,
}

impl PdftoppmRasterizer {
    /// Uses `explicit` if given, otherwise searches PATH and common install dirs.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, SortError> {
        if let Some(path) = explicit {
            return Ok(Self {
                executable: path.to_path_buf(),
            });
        }

        let on_path = PathBuf::from("pdftoppm");
        if responds_to(&on_path, "-v") {
            return Ok(Self {
                executable: on_path,
            });
        }

        COMMON_PDFTOPPM_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .map(|executable| Self { executable })
            .ok_or_else(|| {
                SortError::Rasterize(
                    "pdftoppm not found. Please install poppler-utils or set pdftoppm_path in config.json."
                        .to_string(),
                )
            })
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn rasterize(&self, input: &Path, dpi: u32) -> Result<Vec<RgbImage>, SortError> {
        if !input.is_file() {
            return Err(SortError::InputNotFound(input.to_path_buf()));
        }

        let work_dir = tempfile::tempdir().map_err(|e| SortError::Rasterize(e.to_string()))?;
        let prefix = work_dir.path().join("page");

        let output = Command::new(&self.executable)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(input)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                SortError::Rasterize(format!(
                    "failed to run {}: {}",
                    self.executable.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SortError::Rasterize(format!("pdftoppm failed: {}", stderr)));
        }

        let mut page_files: Vec<(u32, PathBuf)> = std::fs::read_dir(work_dir.path())
            .map_err(|e| SortError::Rasterize(e.to_string()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter_map(|path| page_number(&path).map(|n| (n, path)))
            .collect();
        page_files.sort_by_key(|(n, _)| *n);

        if page_files.is_empty() {
            return Err(SortError::EmptyDocument);
        }

        let mut pages = Vec::with_capacity(page_files.len());
        for (number, path) in &page_files {
            let img = image::open(path).map_err(|e| {
                SortError::Rasterize(format!("failed to load page {}: {}", number, e))
            })?;
            pages.push(img.to_rgb8());
        }

        log(&format!(
            "Rasterized {} pages at {} DPI from {}",
            pages.len(),
            dpi,
            input.display()
        ));

        Ok(pages)
    }
}

/// Page number of a pdftoppm output file (`page-07.png` → 7).
fn page_number(path: &Path) -> Option<u32> {
    if path.extension().and_then(|e| e.to_str()) != Some("png") {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .rsplit('-')
        .next()?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_page_number_from_output_name() {
        assert_eq!(page_number(Path::new("/tmp/x/page-1.png")), Some(1));
        assert_eq!(page_number(Path::new("/tmp/x/page-007.png")), Some(7));
        assert_eq!(page_number(Path::new("/tmp/x/page-12.png")), Some(12));
        assert_eq!(page_number(Path::new("/tmp/x/page-12.ppm")), None);
        assert_eq!(page_number(Path::new("/tmp/x/page.png")), None);
    }

    #[test]
    fn test_missing_input_is_reported() {
        let dir = tempdir().unwrap();
        let rasterizer = PdftoppmRasterizer {
            executable: PathBuf::from("pdftoppm"),
        };
        let missing = dir.path().join("missing.pdf");

        let result = rasterizer.rasterize(&missing, 200);

        assert!(matches!(result, Err(SortError::InputNotFound(p)) if p == missing));
    }
}
