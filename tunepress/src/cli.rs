//! Command-line interface
//!
//! `tunepress <audio-file-or-directory> [output-directory] [--force|-f]`

use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use tunepress_common::config::CliOverrides;

const EXAMPLES: &str = "\
Examples:
  tunepress song.flac
  tunepress ./music-files/
  tunepress song.flac ./src/content/music/
  tunepress ./music-files/ --force";

/// Command-line arguments for tunepress
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "tunepress")]
#[command(about = "Generate Markdown content records from audio file metadata")]
#[command(version)]
#[command(after_help = EXAMPLES)]
pub struct Args {
    /// Audio file or directory of audio files
    pub input: Option<PathBuf>,

    /// Directory receiving the generated records
    pub output: Option<PathBuf>,

    /// Regenerate records even when they are newer than the audio
    #[arg(short, long)]
    pub force: bool,

    /// Config file (default: <config dir>/tunepress/config.toml, then ./tunepress.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// ffprobe executable
    #[arg(long, value_name = "PATH")]
    pub ffprobe: Option<String>,

    /// Per-file probe timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub probe_timeout: Option<u64>,

    /// JSON file holding stable per-record build dates
    #[arg(long, value_name = "PATH")]
    pub build_cache: Option<PathBuf>,

    /// Debug logging (RUST_LOG still takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Settings overrides taken from the command line
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            content_dir: self.output.clone(),
            probe_binary: self.ffprobe.clone(),
            probe_timeout_secs: self.probe_timeout,
            build_cache: self.build_cache.clone(),
            verbose: self.verbose,
        }
    }
}

/// Full help text, printed when no input is given
pub fn usage() -> String {
    Args::command().render_help().to_string()
}
