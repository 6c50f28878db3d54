//! Freshly extracted audio metadata

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Supported audio container/codec families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Flac,
    Mp3,
    Wav,
    Aiff,
    Ogg,
    M4a,
    Aac,
    Unknown,
}

impl AudioFormat {
    /// Display label used in front-matter and the download link
    pub fn label(&self) -> &'static str {
        match self {
            AudioFormat::Flac => "FLAC",
            AudioFormat::Mp3 => "MP3",
            AudioFormat::Wav => "WAV",
            AudioFormat::Aiff => "AIFF",
            AudioFormat::Ogg => "OGG",
            AudioFormat::M4a => "M4A",
            AudioFormat::Aac => "AAC",
            AudioFormat::Unknown => "Unknown",
        }
    }

    /// MIME type; unknown formats fall back to `audio/mpeg`
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Flac => "audio/flac",
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Aiff => "audio/aiff",
            AudioFormat::Ogg => "audio/ogg",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Aac => "audio/aac",
            AudioFormat::Unknown => "audio/mpeg",
        }
    }

    /// Uncompressed or losslessly compressed PCM
    pub fn is_lossless(&self) -> bool {
        matches!(self, AudioFormat::Flac | AudioFormat::Wav | AudioFormat::Aiff)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AudioFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Extracted audio metadata
///
/// Produced fresh on every run; never persisted directly. `title`,
/// `artist`, `album` and `genre` are always non-empty after extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMetadata {
    /// File name including extension
    pub filename: String,

    /// File size in bytes
    pub file_size: u64,

    /// Duration in seconds
    pub duration: f64,

    /// Overall bitrate (bits/sec)
    pub bitrate: u64,

    /// Detected format
    pub format: AudioFormat,

    /// MIME type matching `format`
    pub mime_type: String,

    /// Lowercase extension without the dot (empty if none)
    pub extension: String,

    /// Sample rate (Hz)
    pub sample_rate: u32,

    /// Channel count
    pub channels: u32,

    /// Bits per sample; `None` for lossy formats that don't report one
    pub bit_depth: Option<u32>,

    pub title: String,
    pub artist: String,
    pub album: String,

    /// Loosely typed year or date, normalized when the record is written
    pub date: String,

    /// `date` came from a date/year tag rather than the current-year fallback
    pub date_from_tag: bool,

    pub genre: Vec<String>,
    pub track: String,

    pub composer: Option<String>,
    pub performer: Option<String>,
    pub comment: Option<String>,
    pub description: Option<String>,

    /// Every tag, keys lowercased
    pub all_tags: BTreeMap<String, String>,
}

impl AudioMetadata {
    /// Channel layout label: `Stereo`, `Mono` or `N channels`
    pub fn channel_label(&self) -> String {
        match self.channels {
            1 => "Mono".to_string(),
            2 => "Stereo".to_string(),
            n => format!("{} channels", n),
        }
    }
}
