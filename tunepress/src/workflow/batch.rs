//! Batch driver
//!
//! Accepts a single audio file or a directory. Directory entries are
//! filtered by extension and processed one at a time; a failing file is
//! recorded in the [`BatchReport`] and the batch moves on. Only an invalid
//! input path aborts the run, and that happens before any file is
//! processed. An explicitly named unsupported file is reported as a
//! failure, not silently skipped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tunepress_common::build_dates::BuildDateStore;

use crate::services::file_scanner::{FileScanner, ScanError};
use crate::services::format_detector::is_supported_audio_file;
use crate::services::metadata_extractor::{MetadataExtractor, Prober};
use crate::services::record_writer::{EmitOutcome, RecordEmitter};

/// Invocation-level errors
#[derive(Debug, Error)]
pub enum BatchError {
    /// Input path does not exist
    #[error("{0} does not exist")]
    InvalidInputPath(PathBuf),

    /// Single input file with an unsupported extension (reported per file)
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Input directory could not be listed
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),
}

/// Batch options
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory receiving `<slug>.md` records
    pub output_dir: PathBuf,
    /// Regenerate even when records are up to date
    pub force: bool,
}

/// One file that could not be turned into a record
#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    pub file: PathBuf,
    pub reason: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Records written
    pub generated: Vec<PathBuf>,
    /// Records left untouched because they were up to date
    pub skipped: Vec<PathBuf>,
    /// Per-file failures (extraction or write)
    pub failures: Vec<FileFailure>,
    /// Files excluded by the extension filter
    pub unsupported: usize,
    /// Audio files whose record path was already claimed by another file
    /// earlier in the same run
    pub slug_collisions: Vec<PathBuf>,
}

impl BatchReport {
    /// Files that reached a terminal state
    pub fn processed(&self) -> usize {
        self.generated.len() + self.skipped.len() + self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Display: "N generated, M unchanged, K failed"
    pub fn display_string(&self) -> String {
        format!(
            "{} generated, {} unchanged, {} failed",
            self.generated.len(),
            self.skipped.len(),
            self.failures.len()
        )
    }
}

/// Files selected for a run
#[derive(Debug, Clone, Default)]
pub struct BatchPlan {
    /// Supported audio files, in processing order
    pub files: Vec<PathBuf>,
    /// Directory entries excluded by the extension filter
    pub ignored: usize,
    /// Explicitly named files with an unsupported extension
    pub rejected: Vec<PathBuf>,
}

/// Sequential batch driver
pub struct BatchDriver<P: Prober> {
    extractor: MetadataExtractor<P>,
    emitter: RecordEmitter,
    scanner: FileScanner,
    build_dates: Box<dyn BuildDateStore>,
}

impl<P: Prober> BatchDriver<P> {
    pub fn new(prober: P, options: BatchOptions, build_dates: Box<dyn BuildDateStore>) -> Self {
        Self {
            extractor: MetadataExtractor::new(prober),
            emitter: RecordEmitter::new(options.output_dir, options.force),
            scanner: FileScanner::new(),
            build_dates,
        }
    }

    /// Build-date store, for inspection after a run
    pub fn build_dates(&self) -> &dyn BuildDateStore {
        self.build_dates.as_ref()
    }

    /// Resolve `input` to the files to process
    ///
    /// Fails before any work starts only when the path is missing or the
    /// directory cannot be listed.
    pub fn plan(&self, input: &Path) -> Result<BatchPlan, BatchError> {
        if !input.exists() {
            return Err(BatchError::InvalidInputPath(input.to_path_buf()));
        }

        if input.is_dir() {
            let scan = self.scanner.scan(input)?;
            tracing::info!(
                dir = %input.display(),
                "Found {} audio files to process",
                scan.files.len()
            );
            return Ok(BatchPlan {
                files: scan.files,
                ignored: scan.ignored,
                rejected: Vec::new(),
            });
        }

        if !is_supported_audio_file(input) {
            return Ok(BatchPlan {
                rejected: vec![input.to_path_buf()],
                ..Default::default()
            });
        }

        Ok(BatchPlan {
            files: vec![input.to_path_buf()],
            ..Default::default()
        })
    }

    /// Process a file or every supported file of a directory
    ///
    /// **Algorithm:**
    /// 1. [`plan`](Self::plan) the file list (fatal errors only here)
    /// 2. For each file: extract, then hand off to the record emitter
    /// 3. Record each outcome; failures never stop the loop
    /// 4. Flush the build-date store
    pub async fn run(&mut self, input: &Path) -> Result<BatchReport, BatchError> {
        let plan = self.plan(input)?;

        let mut report = BatchReport {
            unsupported: plan.ignored + plan.rejected.len(),
            ..Default::default()
        };

        for file in plan.rejected {
            let reason = BatchError::UnsupportedFormat(file.clone()).to_string();
            tracing::warn!(file = %file.display(), "{}", reason);
            report.failures.push(FileFailure { file, reason });
        }

        let mut claimed = HashMap::new();
        for file in &plan.files {
            self.process_file(file, &mut report, &mut claimed).await;
        }

        if let Err(e) = self.build_dates.flush() {
            tracing::warn!("Failed to persist build-date cache: {}", e);
        }

        tracing::info!(
            generated = report.generated.len(),
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            unsupported = report.unsupported,
            collisions = report.slug_collisions.len(),
            "Batch complete"
        );

        Ok(report)
    }

    /// Run one file through the pipeline, recording the result in `report`
    ///
    /// `claimed` maps each record path produced so far in this run to the
    /// audio file it came from.
    async fn process_file(
        &mut self,
        file: &Path,
        report: &mut BatchReport,
        claimed: &mut HashMap<PathBuf, PathBuf>,
    ) {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.display().to_string());
        tracing::info!(file = %name, "Processing");

        let metadata = match self.extractor.extract(file).await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::warn!(file = %file.display(), "Metadata extraction failed: {}", e);
                report.failures.push(FileFailure {
                    file: file.to_path_buf(),
                    reason: e.to_string(),
                });
                None
            }
        };

        if let Some(metadata) = &metadata {
            let record = self.emitter.record_path(metadata);
            match claimed.get(&record) {
                Some(owner) if owner != file => {
                    tracing::warn!(
                        file = %file.display(),
                        record = %record.display(),
                        owner = %owner.display(),
                        "Record path already produced by another file in this run"
                    );
                    report.slug_collisions.push(file.to_path_buf());
                }
                Some(_) => {}
                None => {
                    claimed.insert(record, file.to_path_buf());
                }
            }
        }

        match self
            .emitter
            .emit(metadata.as_ref(), file, self.build_dates.as_mut())
            .await
        {
            Ok(EmitOutcome::Generated { path, .. }) => report.generated.push(path),
            Ok(EmitOutcome::Unchanged { path }) => report.skipped.push(path),
            Ok(EmitOutcome::NoRecord) => {}
            Err(e) => {
                tracing::error!(file = %file.display(), "Failed to write record: {}", e);
                report.failures.push(FileFailure {
                    file: file.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
    }
}
