//! Configuration loading and settings resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is normal operation. A config file that fails to
//! parse is logged and ignored so a typo never blocks a content sync.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable overriding the output directory
pub const ENV_CONTENT_DIR: &str = "TUNEPRESS_CONTENT_DIR";
/// Environment variable overriding the probe binary
pub const ENV_FFPROBE: &str = "TUNEPRESS_FFPROBE";
/// Environment variable overriding the probe timeout (seconds)
pub const ENV_PROBE_TIMEOUT: &str = "TUNEPRESS_PROBE_TIMEOUT";
/// Environment variable pointing at the build-date cache file
pub const ENV_BUILD_CACHE: &str = "TUNEPRESS_BUILD_CACHE";

/// Compiled default values
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub content_dir: PathBuf,
    pub probe_binary: String,
    pub probe_timeout_secs: u64,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("src/content/music"),
            probe_binary: "ffprobe".to_string(),
            probe_timeout_secs: 10,
            log_level: "info".to_string(),
        }
    }
}

/// Logging section of the TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// Probe section of the TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Probe executable name or path
    pub binary: Option<String>,
    /// Per-file probe timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// On-disk TOML configuration
///
/// All fields are optional; anything absent falls through to the compiled
/// default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub content_dir: Option<PathBuf>,
    pub build_cache: Option<PathBuf>,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load the config file if one can be found, else defaults
    ///
    /// `explicit` wins over the platform config dir and the working
    /// directory fallback.
    pub fn discover(explicit: Option<&Path>) -> Self {
        let Some(path) = locate_config_file(explicit) else {
            debug!("No config file found, using defaults");
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                debug!(path = %path.display(), "Loaded config file");
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Overrides collected from the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub content_dir: Option<PathBuf>,
    pub probe_binary: Option<String>,
    pub probe_timeout_secs: Option<u64>,
    pub build_cache: Option<PathBuf>,
    pub verbose: bool,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub content_dir: PathBuf,
    pub probe_binary: String,
    pub probe_timeout: Duration,
    pub build_cache: Option<PathBuf>,
    pub log_level: String,
}

/// Resolves [`Settings`] from CLI, environment, TOML and defaults
pub struct SettingsResolver {
    toml: TomlConfig,
    defaults: CompiledDefaults,
}

impl SettingsResolver {
    pub fn new(toml: TomlConfig) -> Self {
        Self {
            toml,
            defaults: CompiledDefaults::default(),
        }
    }

    pub fn resolve(&self, cli: &CliOverrides) -> Settings {
        let content_dir = cli
            .content_dir
            .clone()
            .or_else(|| env_path(ENV_CONTENT_DIR))
            .or_else(|| self.toml.content_dir.clone())
            .unwrap_or_else(|| self.defaults.content_dir.clone());

        let probe_binary = cli
            .probe_binary
            .clone()
            .or_else(|| env_string(ENV_FFPROBE))
            .or_else(|| self.toml.probe.binary.clone())
            .unwrap_or_else(|| self.defaults.probe_binary.clone());

        let probe_timeout_secs = cli
            .probe_timeout_secs
            .or_else(|| env_u64(ENV_PROBE_TIMEOUT))
            .or(self.toml.probe.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or(self.defaults.probe_timeout_secs);

        let build_cache = cli
            .build_cache
            .clone()
            .or_else(|| env_path(ENV_BUILD_CACHE))
            .or_else(|| self.toml.build_cache.clone());

        let log_level = if cli.verbose {
            "debug".to_string()
        } else {
            self.toml
                .logging
                .level
                .clone()
                .unwrap_or_else(|| self.defaults.log_level.clone())
        };

        Settings {
            content_dir,
            probe_binary,
            probe_timeout: Duration::from_secs(probe_timeout_secs),
            build_cache,
            log_level,
        }
    }
}

/// Find the config file: explicit path, then `<config_dir>/tunepress/config.toml`,
/// then `./tunepress.toml`
fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let user_config = dirs::config_dir().map(|d| d.join("tunepress").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let local = PathBuf::from("tunepress.toml");
    local.exists().then_some(local)
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_path(name: &str) -> Option<PathBuf> {
    env_string(name).map(PathBuf::from)
}

fn env_u64(name: &str) -> Option<u64> {
    let raw = env_string(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring non-numeric {}={}", name, raw);
            None
        }
    }
}
