//! Audio file discovery
//!
//! Lists the immediate entries of an input directory and keeps the files
//! the format detector accepts. Subdirectories are not descended into;
//! symlinks are resolved, so a linked audio file counts like a regular one.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use super::format_detector::is_supported_audio_file;

/// Directory scanning errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Result of scanning one directory
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Supported audio files, sorted by path
    pub files: Vec<PathBuf>,
    /// Regular files excluded by the extension filter
    pub ignored: usize,
}

/// Flat audio file scanner
pub struct FileScanner {
    ignore_patterns: Vec<String>,
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FileScanner {
    /// Create a scanner that ignores OS clutter (`.DS_Store`, `Thumbs.db`,
    /// AppleDouble `._*` files)
    pub fn new() -> Self {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                "._".to_string(),
            ],
        }
    }

    /// Scan `dir` for supported audio files
    pub fn scan(&self, dir: &Path) -> Result<ScanResult, ScanError> {
        if !dir.exists() {
            return Err(ScanError::PathNotFound(dir.to_path_buf()));
        }
        if !dir.is_dir() {
            return Err(ScanError::NotADirectory(dir.to_path_buf()));
        }

        let mut result = ScanResult::default();

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !self.is_ignored(e));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    if is_supported_audio_file(entry.path()) {
                        result.files.push(entry.into_path());
                    } else {
                        result.ignored += 1;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                }
            }
        }

        result.files.sort();

        tracing::debug!(
            dir = %dir.display(),
            audio_files = result.files.len(),
            ignored = result.ignored,
            "Scan complete"
        );

        Ok(result)
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        self.ignore_patterns
            .iter()
            .any(|pattern| name.starts_with(pattern.as_str()))
    }
}
