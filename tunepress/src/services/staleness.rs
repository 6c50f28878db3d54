//! Regeneration decision for a content record
//!
//! A record is regenerated when forced, when it does not exist yet, or when
//! its source audio file was modified strictly after the record was. Only
//! modification times are compared.

use std::path::Path;
use std::time::SystemTime;

/// Outcome of the staleness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalenessDecision {
    /// `--force` was given
    Forced,
    /// No record file yet
    RecordMissing,
    /// Audio mtime is newer than record mtime
    SourceNewer,
    /// Record is at least as new as the audio file
    UpToDate,
}

impl StalenessDecision {
    pub fn should_regenerate(&self) -> bool {
        !matches!(self, StalenessDecision::UpToDate)
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Decide whether `record_path` must be regenerated from `audio_path`
///
/// If either mtime cannot be read, the record is regenerated.
pub fn check_staleness(audio_path: &Path, record_path: &Path, force: bool) -> StalenessDecision {
    if force {
        return StalenessDecision::Forced;
    }

    if !record_path.exists() {
        return StalenessDecision::RecordMissing;
    }

    match (modified(audio_path), modified(record_path)) {
        (Some(audio), Some(record)) if audio <= record => StalenessDecision::UpToDate,
        _ => StalenessDecision::SourceNewer,
    }
}

/// Convenience predicate over [`check_staleness`]
pub fn should_regenerate(audio_path: &Path, record_path: &Path, force: bool) -> bool {
    check_staleness(audio_path, record_path, force).should_regenerate()
}
