/// Folder scanning: finds the DNG files directly inside a folder.

use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::error::ScanError;

/// Extension of the files we convert, compared case-insensitively
pub const RAW_EXTENSION: &str = "dng";

/// Why the folder typed or picked by the user cannot be used
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FolderProblem {
    #[error("Please select a folder first.")]
    NoFolder,

    #[error("The selected path is not a folder.")]
    InvalidFolder,
}

/// Check the folder field before a run starts
pub fn validate_folder(input: &str) -> Result<PathBuf, FolderProblem> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FolderProblem::NoFolder);
    }

    let path = PathBuf::from(trimmed);
    if !path.is_dir() {
        return Err(FolderProblem::InvalidFolder);
    }
    Ok(path)
}

/// True when the path has a `.dng` extension in any letter case
pub fn is_dng(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(RAW_EXTENSION))
        .unwrap_or(false)
}

/// List the DNG files directly inside `dir` (no recursion).
///
/// Order is whatever the directory listing yields. An empty result is
/// not an error.
pub fn scan_folder(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.exists() {
        return Err(ScanError::NotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }

    tracing::info!("🔍 Scanning folder: {}", dir.display());

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(ScanError::Listing { path: dir.to_path_buf(), source: err });
            }
            Err(err) => {
                tracing::warn!("⚠️  Skipping unreadable entry: {}", err);
                continue;
            }
        };

        // Only process files (not directories)
        if !entry.file_type().is_file() {
            continue;
        }

        if is_dng(entry.path()) {
            files.push(entry.into_path());
        }
    }

    tracing::info!("Found {} DNG file(s) in {}", files.len(), dir.display());
    Ok(files)
}
