//! In-process stand-in for ffprobe

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tunepress::services::metadata_extractor::{MetadataError, ProbeOutput, Prober};

/// Returns canned probe JSON keyed by file name
///
/// Unknown files fail the way ffprobe does on an unreadable input.
#[derive(Debug, Clone, Default)]
pub struct FakeProber {
    responses: HashMap<String, Result<String, String>>,
}

impl FakeProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer probes of `filename` with `json`
    pub fn with_output(mut self, filename: &str, json: impl Into<String>) -> Self {
        self.responses.insert(filename.to_string(), Ok(json.into()));
        self
    }

    /// Fail probes of `filename` with a non-zero exit
    pub fn with_failure(mut self, filename: &str, stderr: &str) -> Self {
        self.responses
            .insert(filename.to_string(), Err(stderr.to_string()));
        self
    }
}

#[async_trait]
impl Prober for FakeProber {
    async fn probe(&self, path: &Path) -> Result<ProbeOutput, MetadataError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match self.responses.get(&name) {
            Some(Ok(json)) => ProbeOutput::from_json(json.as_bytes()),
            Some(Err(stderr)) => Err(MetadataError::ProbeFailed {
                code: Some(1),
                stderr: stderr.clone(),
            }),
            None => Err(MetadataError::ProbeFailed {
                code: Some(1),
                stderr: format!("{}: Invalid data found when processing input", name),
            }),
        }
    }
}
