//! Existing content record reader
//!
//! Reads only the front-matter of a previously generated record so the
//! merger can carry hand-edited fields forward. The body is ignored and the
//! file is never modified.

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::models::ExistingFrontMatter;

/// Front-matter delimiter line
pub const DELIMITER: &str = "---";

/// Why a record's front-matter could not be used
#[derive(Debug, Error)]
pub enum FrontMatterError {
    /// File does not start with a `---` block closed by another `---`
    #[error("No front-matter block delimited by '---'")]
    MissingDelimiters,

    /// Block is not a YAML mapping
    #[error("Malformed front-matter: {0}")]
    Yaml(String),
}

/// Slice out the text between the opening and closing `---` lines
pub fn front_matter_block(content: &str) -> Option<&str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');

    let first = lines.next()?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Some(&content[start..offset]);
        }
        offset += line.len();
    }

    None
}

/// Parse the front-matter of a record's full text
pub fn parse_front_matter(content: &str) -> Result<ExistingFrontMatter, FrontMatterError> {
    let block = front_matter_block(content).ok_or(FrontMatterError::MissingDelimiters)?;

    if block.trim().is_empty() {
        return Ok(ExistingFrontMatter::default());
    }

    let fields: BTreeMap<String, serde_yml::Value> =
        serde_yml::from_str(block).map_err(|e| FrontMatterError::Yaml(e.to_string()))?;

    Ok(ExistingFrontMatter::from_fields(fields))
}

/// Read an existing record, if there is a usable one
///
/// Absent file → `None`. Unreadable file or malformed front-matter →
/// `None` plus a warning; the record is then regenerated from scratch.
pub async fn read_existing_record(path: &Path) -> Option<ExistingFrontMatter> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(file = %path.display(), "Cannot read existing record: {}", e);
            return None;
        }
    };

    match parse_front_matter(&content) {
        Ok(existing) => {
            tracing::debug!(
                file = %path.display(),
                preserved_date = ?existing.date,
                has_description = existing.description.is_some(),
                extra_keys = existing.extra.len(),
                "Read existing record"
            );
            Some(existing)
        }
        Err(e) => {
            tracing::warn!(
                file = %path.display(),
                "Treating existing record as absent: {}",
                e
            );
            None
        }
    }
}
