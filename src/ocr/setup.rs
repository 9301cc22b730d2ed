use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::log;

/// Common install locations checked when tesseract is not on PATH.
const COMMON_TESSERACT_PATHS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

pub struct TesseractPaths {
    pub executable: PathBuf,
    /// None means the engine's compiled-in tessdata location is used
    pub tessdata: Option<PathBuf>,
}

/// Locates Tesseract, honoring explicit overrides first.
///
/// Fails when no runnable executable can be found; a missing tessdata
/// directory is not an error since system installs know their own.
pub fn ensure_tesseract(
    executable: Option<&Path>,
    tessdata: Option<&Path>,
) -> Result<TesseractPaths> {
    let executable = match executable {
        Some(path) if responds_to(path, "--version") => path.to_path_buf(),
        Some(path) => {
            return Err(anyhow!(
                "Configured tesseract at {} is not runnable",
                path.display()
            ));
        }
        None => find_tesseract_executable()?,
    };
    let tessdata = find_tessdata_dir(tessdata);

    log(&format!("Tesseract found at: {}", executable.display()));
    if let Some(dir) = &tessdata {
        log(&format!("Using tessdata from: {}", dir.display()));
    }

    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Returns true if `<exe> <flag>` runs and exits successfully.
pub(crate) fn responds_to(exe: &Path, flag: &str) -> bool {
    Command::new(exe)
        .arg(flag)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Finds the Tesseract executable, checking PATH first, then common install dirs
pub fn find_tesseract_executable() -> Result<PathBuf> {
    let on_path = PathBuf::from("tesseract");
    if responds_to(&on_path, "--version") {
        return Ok(on_path);
    }

    for path in COMMON_TESSERACT_PATHS {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "Tesseract not found. Please install Tesseract-OCR or set tesseract_path in config.json."
    ))
}

/// Finds the tessdata directory containing eng.traineddata
pub fn find_tessdata_dir(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = explicit {
        return Some(dir.to_path_buf());
    }

    // Check TESSDATA_PREFIX environment variable
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if p.join("eng.traineddata").exists() {
            return Some(p);
        }
        let p = p.join("tessdata");
        if p.join("eng.traineddata").exists() {
            return Some(p);
        }
    }

    None
}
