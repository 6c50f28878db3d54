//! Audio and record fixtures

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tunepress::services::record_reader::parse_front_matter;
use tunepress::{BatchDriver, BatchOptions};
use tunepress_common::build_dates::MemoryBuildDateStore;
use tunepress::models::ExistingFrontMatter;

use super::FakeProber;

/// Probe JSON for a 44.1 kHz / 16-bit stereo FLAC stream with `tags`
pub fn flac_probe_json(tags: &[(&str, &str)], duration_secs: f64) -> String {
    let tags: serde_json::Map<String, serde_json::Value> = tags
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
        .collect();

    serde_json::json!({
        "streams": [{
            "codec_type": "audio",
            "codec_name": "flac",
            "sample_rate": "44100",
            "channels": 2,
            "bits_per_sample": 0,
            "bits_per_raw_sample": "16"
        }],
        "format": {
            "format_name": "flac",
            "duration": format!("{:.6}", duration_secs),
            "size": "12345678",
            "bit_rate": "399000",
            "tags": tags
        }
    })
    .to_string()
}

/// Write a placeholder audio file (content is never decoded)
pub fn write_audio_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"fLaC\0\0\0\x22").unwrap();
    path
}

pub fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

/// Move a file's mtime one hour into the past
pub fn backdate(path: &Path) {
    set_mtime(path, SystemTime::now() - Duration::from_secs(3600));
}

/// Driver writing into `output_dir` with an in-memory build-date store
pub fn test_driver(prober: FakeProber, output_dir: &Path, force: bool) -> BatchDriver<FakeProber> {
    BatchDriver::new(
        prober,
        BatchOptions {
            output_dir: output_dir.to_path_buf(),
            force,
        },
        Box::new(MemoryBuildDateStore::new()),
    )
}

/// Read a generated record: full text plus its parsed front-matter
pub fn read_record(path: &Path) -> (String, ExistingFrontMatter) {
    let content = std::fs::read_to_string(path).unwrap();
    let front = parse_front_matter(&content).unwrap();
    (content, front)
}
