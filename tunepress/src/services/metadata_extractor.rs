//! Audio metadata extraction service
//!
//! Runs an external probe (ffprobe) that reports container, stream and tag
//! information as JSON, then normalizes it into [`AudioMetadata`].
//!
//! Extracts:
//! - Title, artist, album, date, genre, track (with fallbacks)
//! - Duration, bitrate, file size
//! - Sample rate, channels, bit depth
//! - Format and MIME type (via the format detector)
//! - Every tag, keys lowercased

use async_trait::async_trait;
use chrono::Datelike;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

use super::format_detector::{detect_format, extension_of};
use crate::models::AudioMetadata;

/// Metadata extraction errors
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Probe executable is not installed / not on PATH
    #[error("Probe binary not found: {0}")]
    ProbeNotFound(String),

    /// Probe did not finish within the configured timeout
    #[error("Probe timed out after {0:?}")]
    Timeout(Duration),

    /// Probe exited with a non-zero status
    #[error("Probe exited with status {code:?}: {stderr}")]
    ProbeFailed { code: Option<i32>, stderr: String },

    /// Probe output was not the expected JSON
    #[error("Unparsable probe output: {0}")]
    ParseError(String),

    /// I/O error (spawning the probe, reading file metadata)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ============================================================================
// Probe output model
// ============================================================================

/// Number that may arrive as a JSON number or a numeric string
///
/// ffprobe prints most numeric fields as strings (`"44100"`), but not all.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(f64),
    Text(String),
}

impl LooseNumber {
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            LooseNumber::Number(n) => *n,
            LooseNumber::Text(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Non-negative integer value, fractional part dropped
    pub fn as_u64(&self) -> Option<u64> {
        self.as_f64().filter(|v| *v >= 0.0).map(|v| v.trunc() as u64)
    }
}

fn coerce_u64(value: &Option<LooseNumber>) -> Option<u64> {
    value.as_ref().and_then(LooseNumber::as_u64)
}

/// `format` section of probe output
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeFormat {
    pub filename: Option<String>,
    pub format_name: Option<String>,
    pub size: Option<LooseNumber>,
    pub duration: Option<LooseNumber>,
    pub bit_rate: Option<LooseNumber>,
    #[serde(default)]
    pub tags: BTreeMap<String, serde_json::Value>,
}

/// One entry of the `streams` array
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeStream {
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub sample_rate: Option<LooseNumber>,
    pub channels: Option<LooseNumber>,
    pub bits_per_sample: Option<LooseNumber>,
    pub bits_per_raw_sample: Option<LooseNumber>,
    #[serde(default)]
    pub tags: BTreeMap<String, serde_json::Value>,
}

/// Complete probe output (`-show_format -show_streams`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeOutput {
    #[serde(default)]
    pub format: ProbeFormat,
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
}

impl ProbeOutput {
    /// Parse raw probe JSON
    pub fn from_json(bytes: &[u8]) -> Result<Self, MetadataError> {
        serde_json::from_slice(bytes).map_err(|e| MetadataError::ParseError(e.to_string()))
    }

    /// First audio stream, else the first stream of any kind
    pub fn audio_stream(&self) -> Option<&ProbeStream> {
        self.streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("audio"))
            .or_else(|| self.streams.first())
    }
}

// ============================================================================
// Prober seam
// ============================================================================

/// Source of probe output for a file
///
/// Production code uses [`FfprobeProber`]; tests substitute canned output.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ProbeOutput, MetadataError>;
}

/// Runs `ffprobe` as a child process
pub struct FfprobeProber {
    binary: String,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<ProbeOutput, MetadataError> {
        let mut command = Command::new(&self.binary);
        command
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .kill_on_drop(true);

        tracing::debug!(
            binary = %self.binary,
            file = %path.display(),
            timeout_s = self.timeout.as_secs_f64(),
            "Running probe"
        );

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => return Err(MetadataError::Timeout(self.timeout)),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MetadataError::ProbeNotFound(self.binary.clone()))
            }
            Ok(Err(e)) => return Err(MetadataError::IoError(e)),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(MetadataError::ProbeFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        ProbeOutput::from_json(&output.stdout)
    }
}

// ============================================================================
// Normalization
// ============================================================================

// Tag fallback chains, first non-empty match wins.
const TITLE_TAGS: &[&str] = &["title"];
const ARTIST_TAGS: &[&str] = &["artist", "album_artist", "albumartist"];
const ALBUM_TAGS: &[&str] = &["album"];
const DATE_TAGS: &[&str] = &["date", "year"];
const TRACK_TAGS: &[&str] = &["track", "tracknumber"];

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_ALBUM: &str = "Unknown Album";
const UNKNOWN_GENRE: &str = "Unknown";
const DEFAULT_TRACK: &str = "1";
const DEFAULT_CHANNELS: u32 = 2;
const DEFAULT_LOSSLESS_BIT_DEPTH: u32 = 16;

/// First non-blank value among `keys`
fn first_tag<'a>(tags: &'a BTreeMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| tags.get(*key))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

fn tag_value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Lowercase all tag keys; container tags first, stream tags fill gaps
pub fn normalize_tags(probe: &ProbeOutput) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();

    let stream_tags = probe.audio_stream().map(|s| &s.tags);
    let sources = std::iter::once(&probe.format.tags).chain(stream_tags);

    for source in sources {
        for (key, value) in source {
            if let Some(value) = tag_value_to_string(value) {
                tags.entry(key.to_lowercase()).or_insert(value);
            }
        }
    }

    tags
}

/// Split `"Electronic, Ambient; Drone"` into trimmed, non-empty genres
pub fn split_genres(raw: Option<&str>) -> Vec<String> {
    let genres: Vec<String> = raw
        .unwrap_or_default()
        .split([',', ';'])
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect();

    if genres.is_empty() {
        vec![UNKNOWN_GENRE.to_string()]
    } else {
        genres
    }
}

/// Build [`AudioMetadata`] from probe output
///
/// `fs_size` is used when the probe omits `format.size`; `current_year`
/// is the date fallback when no date/year tag exists.
pub fn metadata_from_probe(
    path: &Path,
    probe: &ProbeOutput,
    fs_size: Option<u64>,
    current_year: i32,
) -> AudioMetadata {
    let tags = normalize_tags(probe);
    let stream = probe.audio_stream().cloned().unwrap_or_default();

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| filename.clone());

    let format = detect_format(path, stream.codec_name.as_deref());

    let bit_depth = coerce_u64(&stream.bits_per_sample)
        .filter(|b| *b > 0)
        .or_else(|| coerce_u64(&stream.bits_per_raw_sample).filter(|b| *b > 0))
        .map(|b| b as u32)
        .or_else(|| format.is_lossless().then_some(DEFAULT_LOSSLESS_BIT_DEPTH));

    let optional = |key: &str| first_tag(&tags, &[key]).map(str::to_string);
    let tagged_date = first_tag(&tags, DATE_TAGS).map(str::to_string);

    AudioMetadata {
        filename,
        file_size: coerce_u64(&probe.format.size).or(fs_size).unwrap_or(0),
        duration: probe
            .format
            .duration
            .as_ref()
            .and_then(LooseNumber::as_f64)
            .filter(|d| *d >= 0.0)
            .unwrap_or(0.0),
        bitrate: coerce_u64(&probe.format.bit_rate).unwrap_or(0),
        format,
        mime_type: format.mime_type().to_string(),
        extension: extension_of(path).unwrap_or_default(),
        sample_rate: coerce_u64(&stream.sample_rate).unwrap_or(0) as u32,
        channels: coerce_u64(&stream.channels)
            .filter(|c| *c > 0)
            .map(|c| c as u32)
            .unwrap_or(DEFAULT_CHANNELS),
        bit_depth,
        title: first_tag(&tags, TITLE_TAGS).map(str::to_string).unwrap_or(stem),
        artist: first_tag(&tags, ARTIST_TAGS).unwrap_or(UNKNOWN_ARTIST).to_string(),
        album: first_tag(&tags, ALBUM_TAGS).unwrap_or(UNKNOWN_ALBUM).to_string(),
        date_from_tag: tagged_date.is_some(),
        date: tagged_date.unwrap_or_else(|| current_year.to_string()),
        genre: split_genres(tags.get("genre").map(String::as_str)),
        track: first_tag(&tags, TRACK_TAGS).unwrap_or(DEFAULT_TRACK).to_string(),
        composer: optional("composer"),
        performer: optional("performer"),
        comment: optional("comment"),
        description: optional("description"),
        all_tags: tags,
    }
}

// ============================================================================
// Extractor
// ============================================================================

/// Metadata extractor service
pub struct MetadataExtractor<P: Prober> {
    prober: P,
}

impl<P: Prober> MetadataExtractor<P> {
    pub fn new(prober: P) -> Self {
        Self { prober }
    }

    /// Extract metadata from an audio file
    ///
    /// One probe process per call. Failures are returned, never panicked on;
    /// the batch driver decides whether to continue.
    pub async fn extract(&self, file_path: &Path) -> Result<AudioMetadata, MetadataError> {
        let probe = self.prober.probe(file_path).await?;

        let fs_size = tokio::fs::metadata(file_path).await.ok().map(|m| m.len());
        let current_year = chrono::Local::now().year();

        let metadata = metadata_from_probe(file_path, &probe, fs_size, current_year);

        tracing::debug!(
            file = %file_path.display(),
            title = %metadata.title,
            artist = %metadata.artist,
            duration_s = metadata.duration,
            format = %metadata.format,
            "Extracted metadata"
        );

        Ok(metadata)
    }
}
