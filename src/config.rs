//! Configuration loading and types for audiodump
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/audiodump/config.toml)
//! 3. Environment variables (AUDIODUMP_*)
//! 4. CLI arguments (highest priority)

use crate::error::AudiodumpError;
use crate::writer::{ContainerFormat, DumpMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# Audiodump Configuration
#
# Location: ~/.config/audiodump/config.toml
# All settings can be overridden via CLI flags

[dump]
# Directory for dump files. "auto" uses the platform data directory
# (e.g. ~/.local/share/audiodump/dump); nested directories are created
# as needed.
dump_dir = "auto"

# Basename for dump files. Rotated segments get a numeric suffix:
# dspdump.wav, dspdump1.wav, dspdump2.wav, ...
basename = "dspdump"

# Container format: "wav" or "aiff"
format = "wav"

# Dump mode:
# - raw: store samples at the declared source rate, rotate files when
#   the source rate changes mid-stream
# - resample: convert everything to 44100 Hz with linear interpolation
mode = "raw"

# Delete existing dump files without asking
silent = false

# Skip batches that are entirely zero samples
skip_silence = false
"#;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub dump: DumpConfig,
}

/// Dump pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    /// Output directory, or "auto" for the platform data dir
    pub dump_dir: String,
    /// Basename for segment files
    pub basename: String,
    pub format: ContainerFormat,
    pub mode: DumpMode,
    /// Overwrite existing files without prompting
    pub silent: bool,
    /// Elide all-zero batches
    pub skip_silence: bool,
}

impl Default for DumpConfig {
    fn default() -> Self {
        DumpConfig {
            dump_dir: "auto".to_string(),
            basename: "dspdump".to_string(),
            format: ContainerFormat::Wav,
            mode: DumpMode::Raw,
            silent: false,
            skip_silence: false,
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "audiodump")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Resolve the configured dump directory, expanding "auto"
    pub fn resolve_dump_dir(&self) -> PathBuf {
        match self.dump.dump_dir.as_str() {
            "auto" => directories::ProjectDirs::from("", "", "audiodump")
                .map(|dirs| dirs.data_dir().join("dump"))
                .unwrap_or_else(|| PathBuf::from("dump")),
            dir => PathBuf::from(dir),
        }
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Config, AudiodumpError> {
    let mut config = Config::default();

    let config_path = path.map(PathBuf::from).or_else(Config::default_path);

    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| AudiodumpError::Config(format!("Failed to read config: {}", e)))?;

            config = toml::from_str(&contents)
                .map_err(|e| AudiodumpError::Config(format!("Invalid config: {}", e)))?;
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    // Override from environment variables
    if let Ok(dir) = std::env::var("AUDIODUMP_DIR") {
        config.dump.dump_dir = dir;
    }
    if let Ok(format) = std::env::var("AUDIODUMP_FORMAT") {
        config.dump.format = match format.to_lowercase().as_str() {
            "aiff" => ContainerFormat::Aiff,
            _ => ContainerFormat::Wav,
        };
    }
    if let Ok(silent) = std::env::var("AUDIODUMP_SILENT") {
        config.dump.silent = matches!(silent.as_str(), "1" | "true" | "yes");
    }

    Ok(config)
}
