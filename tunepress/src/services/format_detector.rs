//! Audio format detection
//!
//! Classifies a file by extension first. When the extension is missing or
//! unrecognized, the probe's codec name is matched by substring. Nothing
//! here touches the filesystem.

use crate::models::AudioFormat;
use std::path::Path;

/// Extensions accepted by the pipeline (lowercase, no dot)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["flac", "mp3", "wav", "aif", "aiff", "ogg", "m4a", "aac"];

/// Lowercase extension of `path` without the dot, if any
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Map a known extension to its format
fn format_from_extension(ext: &str) -> Option<AudioFormat> {
    match ext {
        "flac" => Some(AudioFormat::Flac),
        "mp3" => Some(AudioFormat::Mp3),
        "wav" => Some(AudioFormat::Wav),
        "aif" | "aiff" => Some(AudioFormat::Aiff),
        "ogg" => Some(AudioFormat::Ogg),
        "m4a" => Some(AudioFormat::M4a),
        "aac" => Some(AudioFormat::Aac),
        _ => None,
    }
}

/// Infer a format from a probe codec name such as `pcm_s16be` or `vorbis`
///
/// PCM is WAV when little-endian and AIFF when big-endian, which is how the
/// two containers store samples.
fn format_from_codec(codec: &str) -> Option<AudioFormat> {
    let codec = codec.to_lowercase();

    if codec.contains("flac") {
        Some(AudioFormat::Flac)
    } else if codec.contains("mp3") {
        Some(AudioFormat::Mp3)
    } else if codec.contains("aac") {
        Some(AudioFormat::Aac)
    } else if codec.contains("pcm") {
        if codec.ends_with("be") {
            Some(AudioFormat::Aiff)
        } else {
            Some(AudioFormat::Wav)
        }
    } else if codec.contains("vorbis") {
        Some(AudioFormat::Ogg)
    } else {
        None
    }
}

/// Detect format from path and optional codec name
///
/// Returns [`AudioFormat::Unknown`] when neither source matches.
pub fn detect_format(path: &Path, codec_name: Option<&str>) -> AudioFormat {
    extension_of(path)
        .as_deref()
        .and_then(format_from_extension)
        .or_else(|| codec_name.and_then(format_from_codec))
        .unwrap_or(AudioFormat::Unknown)
}

/// Whether the pipeline handles this file, judged by extension only
pub fn is_supported_audio_file(path: &Path) -> bool {
    extension_of(path)
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}
