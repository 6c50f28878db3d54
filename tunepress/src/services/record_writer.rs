//! Content record merging and emission
//!
//! Combines freshly extracted metadata with the hand-maintained fields of
//! an existing record and writes `<output_dir>/<slug>.md`:
//!
//! ```text
//! ---
//! <YAML front-matter>
//! ---
//!
//! <Markdown body>
//! ```
//!
//! Fields carried over from an existing record: `date` (re-normalized),
//! `publishDate`, `createdDate`, `description`. Everything else is
//! recomputed on every write.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tunepress_common::build_dates::{stable_last_updated, BuildDateStore};
use tunepress_common::human_format::{format_duration, format_file_size};

use super::record_reader::{read_existing_record, DELIMITER};
use super::staleness::{check_staleness, StalenessDecision};
use crate::models::{AudioMetadata, ExistingFrontMatter, FrontMatter, TechnicalInfo};

/// Description used when neither the record nor the tags provide one
pub const PLACEHOLDER_DESCRIPTION: &str = "No description available.";

const UNKNOWN_ALBUM: &str = "Unknown Album";
const RECORD_LAYOUT: &str = "music";
const MEDIA_URL_PREFIX: &str = "/music-files";

/// Record emission errors
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Failed to create output directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to write record {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Front-matter serialization failed: {0}")]
    Serialize(String),
}

/// What happened to one record
#[derive(Debug, Clone, PartialEq)]
pub enum EmitOutcome {
    /// Record (re)written
    Generated {
        path: PathBuf,
        last_updated: DateTime<Utc>,
    },
    /// Record is current; nothing written
    Unchanged { path: PathBuf },
    /// No metadata, so no record
    NoRecord,
}

// ============================================================================
// Slug and date helpers
// ============================================================================

/// Lowercase, collapse every run of non-alphanumerics to `-`, trim `-`
///
/// Only ASCII letters and digits survive, so accented characters become
/// separators.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Slug for a record; falls back to the audio filename, then `untitled`
pub fn record_slug(metadata: &AudioMetadata) -> String {
    let from_title = slugify(&metadata.title);
    if !from_title.is_empty() {
        return from_title;
    }

    let stem = Path::new(&metadata.filename)
        .file_stem()
        .map(|s| slugify(&s.to_string_lossy()))
        .unwrap_or_default();
    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem
    }
}

fn is_year(s: &str) -> bool {
    s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit())
}

/// `DDDD-DD-DD`, shape only
fn is_iso_date_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%Y.%m.%d",
];

/// Best-effort parse of a free-form date, reduced to its UTC calendar day
fn parse_loose_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Some(dt) = DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.date());
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Some(date);
    }

    // "2024-08" → first of the month
    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d").ok()
}

/// Normalize a loosely typed date to `YYYY-MM-DD`
///
/// - `"2024"` → `"2024-01-01"`
/// - `"2024-08-26"` → unchanged
/// - `"August 26, 2024"` → `"2024-08-26"`
/// - anything unparsable → `today`
pub fn normalize_date(input: &str, today: NaiveDate) -> String {
    let s = input.trim();

    if is_year(s) {
        return format!("{}-01-01", s);
    }
    if is_iso_date_shape(s) {
        return s.to_string();
    }

    parse_loose_date(s)
        .unwrap_or_else(|| {
            tracing::debug!(input = %s, "Unparsable date, using today");
            today
        })
        .format("%Y-%m-%d")
        .to_string()
}

// ============================================================================
// Merge
// ============================================================================

/// Where a record description may come from, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionSource {
    /// `description` of the existing record (hand-edited)
    ExistingRecord,
    /// `comment` tag
    CommentTag,
    /// `description` tag
    DescriptionTag,
}

/// Evaluation order for [`resolve_description`]; first hit wins, then
/// [`PLACEHOLDER_DESCRIPTION`]
pub const DESCRIPTION_SOURCES: &[DescriptionSource] = &[
    DescriptionSource::ExistingRecord,
    DescriptionSource::CommentTag,
    DescriptionSource::DescriptionTag,
];

/// Pick the description following [`DESCRIPTION_SOURCES`]
pub fn resolve_description(
    metadata: &AudioMetadata,
    existing: Option<&ExistingFrontMatter>,
) -> String {
    DESCRIPTION_SOURCES
        .iter()
        .find_map(|source| {
            let candidate = match source {
                DescriptionSource::ExistingRecord => existing.and_then(|e| e.description.as_deref()),
                DescriptionSource::CommentTag => metadata.comment.as_deref(),
                DescriptionSource::DescriptionTag => metadata.description.as_deref(),
            };
            candidate.filter(|d| !d.trim().is_empty())
        })
        .unwrap_or(PLACEHOLDER_DESCRIPTION)
        .to_string()
}

/// Build the front-matter for a (re)generated record
pub fn merge_front_matter(
    metadata: &AudioMetadata,
    existing: Option<&ExistingFrontMatter>,
    today: NaiveDate,
) -> FrontMatter {
    let raw_date = existing
        .and_then(|e| e.date.as_deref())
        .unwrap_or(&metadata.date);
    let date = normalize_date(raw_date, today);

    let publish_date = existing.and_then(|e| e.publish_date.clone());
    let created_date = match existing {
        Some(e) => e.created_date.clone(),
        None => Some(date.clone()),
    };

    let tags = std::iter::once("music".to_string())
        .chain(metadata.genre.iter().map(|g| g.to_lowercase()))
        .collect();

    FrontMatter {
        title: metadata.title.clone(),
        artist: metadata.artist.clone(),
        album: metadata.album.clone(),
        date,
        publish_date,
        created_date,
        genre: metadata.genre.clone(),
        duration: metadata.duration.round() as u64,
        file_size: metadata.file_size,
        filename: metadata.filename.clone(),
        tags,
        layout: RECORD_LAYOUT.to_string(),
        composer: metadata.composer.clone(),
        performer: metadata.performer.clone(),
        description: resolve_description(metadata, existing),
        technical: TechnicalInfo {
            sample_rate: metadata.sample_rate,
            bit_depth: metadata.bit_depth,
            channels: metadata.channel_label(),
            format: metadata.format.label().to_string(),
            mime_type: metadata.mime_type.clone(),
            bitrate: metadata.bitrate,
        },
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Release date for the body, if one is actually known
///
/// A date preserved from an existing record or read from a tag counts; the
/// current-year fallback does not.
pub fn known_release_date<'a>(
    metadata: &AudioMetadata,
    existing: Option<&ExistingFrontMatter>,
    front: &'a FrontMatter,
) -> Option<&'a str> {
    let preserved = existing.is_some_and(|e| e.date.is_some());
    (preserved || metadata.date_from_tag).then_some(front.date.as_str())
}

/// Markdown body: heading, byline, description, player, album information
pub fn render_body(metadata: &AudioMetadata, front: &FrontMatter, release_date: Option<&str>) -> String {
    let media_url = format!("{}/{}", MEDIA_URL_PREFIX, metadata.filename);
    let size = format_file_size(metadata.file_size);

    let mut body = format!("# {}\n\n", front.title);

    body.push_str(&format!("*by {}*\n\n", front.artist));

    body.push_str(&front.description);
    body.push_str("\n\n## Audio Player\n\n");

    body.push_str("<div class=\"music-player\">\n");
    body.push_str("    <div class=\"music-controls\">\n");
    body.push_str("        <audio controls preload=\"metadata\">\n");
    body.push_str(&format!(
        "            <source src=\"{}\" type=\"{}\">\n",
        media_url, metadata.mime_type
    ));
    body.push_str(&format!(
        "            <p>Your browser doesn't support HTML5 audio. <a href=\"{}\">Download the track</a> instead.</p>\n",
        media_url
    ));
    body.push_str("        </audio>\n    </div>\n\n");

    body.push_str("    <div class=\"music-info\">\n");
    let mut info = vec![
        ("Duration", format_duration(metadata.duration)),
        ("File Size", size.clone()),
        ("Sample Rate", format!("{} Hz", metadata.sample_rate)),
    ];
    if let Some(bits) = metadata.bit_depth {
        info.push(("Bit Depth", format!("{} bit", bits)));
    }
    info.push(("Channels", front.technical.channels.clone()));
    info.push(("Genre", metadata.genre.join(", ")));
    for (label, value) in info {
        body.push_str(&format!("        <div><strong>{}:</strong> {}</div>\n", label, value));
    }
    body.push_str("    </div>\n\n");

    body.push_str(&format!(
        "    <a href=\"{}\" class=\"download-link\" download>\n        Download {} ({})\n    </a>\n</div>\n",
        media_url, front.technical.format, size
    ));

    let mut album_lines = Vec::new();
    if front.album != UNKNOWN_ALBUM {
        album_lines.push(format!("**Album:** {}", front.album));
    }
    if let Some(date) = release_date {
        album_lines.push(format!("**Release Date:** {}", date));
    }
    if let Some(composer) = &front.composer {
        album_lines.push(format!("**Composer:** {}", composer));
    }
    if let Some(performer) = &front.performer {
        album_lines.push(format!("**Performer:** {}", performer));
    }
    if !album_lines.is_empty() {
        body.push_str("\n## Album Information\n\n");
        body.push_str(&album_lines.join("\n\n"));
        body.push('\n');
    }

    body
}

/// Serialize front-matter and body into the on-disk document
pub fn render_record(front: &FrontMatter, body: &str) -> Result<String, RecordError> {
    let yaml = serde_yml::to_string(front).map_err(|e| RecordError::Serialize(e.to_string()))?;
    let newline = if yaml.ends_with('\n') { "" } else { "\n" };

    Ok(format!("{DELIMITER}\n{yaml}{newline}{DELIMITER}\n\n{body}"))
}

// ============================================================================
// Emitter
// ============================================================================

/// Writes records into one flat output directory
pub struct RecordEmitter {
    output_dir: PathBuf,
    force: bool,
}

impl RecordEmitter {
    pub fn new(output_dir: impl Into<PathBuf>, force: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            force,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<output_dir>/<slug>.md`
    pub fn record_path(&self, metadata: &AudioMetadata) -> PathBuf {
        self.output_dir.join(format!("{}.md", record_slug(metadata)))
    }

    /// Merge and write the record for one audio file
    ///
    /// **Algorithm:**
    /// 1. `None` metadata → [`EmitOutcome::NoRecord`]
    /// 2. Slug → record path
    /// 3. Staleness check; up to date → [`EmitOutcome::Unchanged`], no write
    /// 4. Read the existing record's preserved fields
    /// 5. Merge, render, create the directory, write
    /// 6. Update the build-date store under the slug
    pub async fn emit(
        &self,
        metadata: Option<&AudioMetadata>,
        audio_path: &Path,
        build_dates: &mut dyn BuildDateStore,
    ) -> Result<EmitOutcome, RecordError> {
        let Some(metadata) = metadata else {
            return Ok(EmitOutcome::NoRecord);
        };

        let path = self.record_path(metadata);

        let decision = check_staleness(audio_path, &path, self.force);
        if decision == StalenessDecision::UpToDate {
            tracing::info!(record = %path.display(), "Skipped (up to date)");
            return Ok(EmitOutcome::Unchanged { path });
        }
        tracing::debug!(record = %path.display(), ?decision, "Regenerating record");

        let existing = read_existing_record(&path).await;
        if let Some(existing) = &existing {
            if !existing.extra.is_empty() {
                tracing::debug!(
                    record = %path.display(),
                    keys = existing.extra.len(),
                    "Recomputing non-preserved front-matter keys"
                );
            }
        }

        let now = Utc::now();
        let front = merge_front_matter(metadata, existing.as_ref(), now.date_naive());
        let release_date = known_release_date(metadata, existing.as_ref(), &front);
        let body = render_body(metadata, &front, release_date);
        let document = render_record(&front, &body)?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| RecordError::CreateDir(self.output_dir.clone(), e))?;
        tokio::fs::write(&path, &document)
            .await
            .map_err(|e| RecordError::Write(path.clone(), e))?;

        let slug = record_slug(metadata);
        let last_updated = stable_last_updated(build_dates, &slug, document.as_bytes(), now);

        tracing::info!(record = %path.display(), "Generated");
        Ok(EmitOutcome::Generated { path, last_updated })
    }
}
