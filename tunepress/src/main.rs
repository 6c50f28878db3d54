//! tunepress - audio metadata to Markdown content records
//!
//! Exit codes: 0 on completion (per-file failures and unsupported files
//! included) or help, 1 when no input is given, the input path is missing,
//! or the arguments cannot be parsed.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tunepress::cli::{usage, Args};
use tunepress::{BatchDriver, BatchOptions, BatchReport, FfprobeProber};
use tunepress_common::build_dates::{BuildDateStore, JsonFileBuildDateStore, MemoryBuildDateStore};
use tunepress_common::config::{Settings, SettingsResolver, TomlConfig};

/// `RUST_LOG` if set, else `default_level`
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Load the config file under a temporary subscriber so its warnings are
/// visible before the configured level is known
fn load_config(args: &Args) -> TomlConfig {
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter(if args.verbose { "debug" } else { "info" }))
        .with_target(false)
        .finish();

    tracing::subscriber::with_default(bootstrap, || TomlConfig::discover(args.config.as_deref()))
}

fn init_tracing(settings: &Settings) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&settings.log_level))
        .with_target(false)
        .init();
}

fn log_banner(settings: &Settings) {
    info!(
        "tunepress v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("TUNEPRESS_GIT_HASH"),
        env!("TUNEPRESS_BUILD_TIMESTAMP"),
        env!("TUNEPRESS_BUILD_PROFILE"),
    );
    info!(
        content_dir = %settings.content_dir.display(),
        probe = %settings.probe_binary,
        probe_timeout_s = settings.probe_timeout.as_secs(),
        "Settings resolved"
    );
}

fn open_build_dates(settings: &Settings) -> Box<dyn BuildDateStore> {
    match &settings.build_cache {
        Some(path) => {
            info!(path = %path.display(), "Using build-date cache");
            Box::new(JsonFileBuildDateStore::open(path))
        }
        None => Box::new(MemoryBuildDateStore::new()),
    }
}

async fn run(input: &Path, args: &Args, settings: &Settings) -> Result<BatchReport> {
    let prober = FfprobeProber::new(settings.probe_binary.clone(), settings.probe_timeout);
    let options = BatchOptions {
        output_dir: settings.content_dir.clone(),
        force: args.force,
    };

    let mut driver = BatchDriver::new(prober, options, open_build_dates(settings));
    driver
        .run(input)
        .await
        .with_context(|| format!("Cannot process {}", input.display()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Help and version print to stdout and succeed
            return match e.print() {
                Ok(()) if !e.use_stderr() => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    let Some(input) = args.input.clone() else {
        println!("{}", usage());
        return ExitCode::from(1);
    };

    let toml = load_config(&args);
    let settings = SettingsResolver::new(toml).resolve(&args.overrides());
    init_tracing(&settings);
    log_banner(&settings);

    match run(&input, &args, &settings).await {
        Ok(report) => {
            for failure in &report.failures {
                error!(file = %failure.file.display(), "Failed: {}", failure.reason);
            }
            println!("Processing complete: {}", report.display_string());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}
