//! Pipeline services
//!
//! One module per pipeline stage:
//! - format detection and file discovery
//! - metadata extraction through an external probe
//! - reading, staleness-checking and writing content records

pub mod file_scanner;
pub mod format_detector;
pub mod metadata_extractor;
pub mod record_reader;
pub mod record_writer;
pub mod staleness;

pub use file_scanner::{FileScanner, ScanError, ScanResult};
pub use format_detector::{detect_format, is_supported_audio_file, SUPPORTED_EXTENSIONS};
pub use metadata_extractor::{FfprobeProber, MetadataError, MetadataExtractor, ProbeOutput, Prober};
pub use record_reader::{parse_front_matter, read_existing_record, FrontMatterError};
pub use record_writer::{
    merge_front_matter, normalize_date, slugify, EmitOutcome, RecordEmitter, RecordError,
};
pub use staleness::{check_staleness, should_regenerate, StalenessDecision};
