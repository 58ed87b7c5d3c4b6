//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/eventscope/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/eventscope/` (~/.config/eventscope/)
//! - State/Logs: `$XDG_STATE_HOME/eventscope/` (~/.local/state/eventscope/)
//!
//! ```toml
//! [pipeline]
//! timezone = "America/New_York"
//! sample_cap = 500
//!
//! [logging]
//! level = "debug"
//! ```

use crate::aggregate::{DEFAULT_SAMPLE_CAP, DEFAULT_SUBSET_POINTS};
use crate::datetime::{Timezone, DEFAULT_SAMPLE_SIZE};
use crate::error::{Error, Result};
use crate::ingest::{IngestOptions, DEFAULT_PROGRESS_INTERVAL};
use crate::logging::LOG_FILE_PREFIX;
use crate::pipeline::PipelineConfig;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Ingestion and aggregation settings
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The `[pipeline]` section
#[derive(Debug, Deserialize, Clone)]
pub struct PipelineSettings {
    /// IANA zone for offset-free timestamps, or "local"
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Maximum rows kept in the stride sample
    #[serde(default = "default_sample_cap")]
    pub sample_cap: usize,

    /// Rows inspected when detecting the timestamp column
    #[serde(default = "default_detection_sample_size")]
    pub detection_sample_size: usize,

    /// Use a timestamp-sounding header when no column qualifies by content
    #[serde(default = "default_header_fallback")]
    pub header_fallback: bool,

    /// Rows between progress reports
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    /// Point budget for subset consumers
    #[serde(default = "default_subset_points")]
    pub subset_points: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            sample_cap: default_sample_cap(),
            detection_sample_size: default_detection_sample_size(),
            header_fallback: default_header_fallback(),
            progress_interval: default_progress_interval(),
            subset_points: default_subset_points(),
        }
    }
}

impl PipelineSettings {
    /// The configured zone. Unknown identifiers fall back to the runtime default.
    pub fn timezone(&self) -> Timezone {
        Timezone::from_id(&self.timezone)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.sample_cap == 0 {
            return Err(Error::Config(
                "pipeline.sample_cap must be at least 1".to_string(),
            ));
        }
        if self.detection_sample_size == 0 {
            return Err(Error::Config(
                "pipeline.detection_sample_size must be at least 1".to_string(),
            ));
        }
        if self.progress_interval == 0 {
            return Err(Error::Config(
                "pipeline.progress_interval must be at least 1".to_string(),
            ));
        }
        if self.subset_points == 0 {
            return Err(Error::Config(
                "pipeline.subset_points must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the runtime pipeline configuration.
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            timezone: self.timezone(),
            ingest: IngestOptions {
                sample_size: self.detection_sample_size,
                header_fallback: self.header_fallback,
                progress_interval: self.progress_interval,
            },
            sample_cap: self.sample_cap,
        }
    }
}

fn default_timezone() -> String {
    "local".to_string()
}

fn default_sample_cap() -> usize {
    DEFAULT_SAMPLE_CAP
}

fn default_detection_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

fn default_header_fallback() -> bool {
    true
}

fn default_progress_interval() -> usize {
    DEFAULT_PROGRESS_INTERVAL
}

fn default_subset_points() -> usize {
    DEFAULT_SUBSET_POINTS
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        Self::parse(&content)
    }

    /// Parse and validate TOML configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.pipeline.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/eventscope/config.toml` (~/.config/eventscope/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("eventscope").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/eventscope/` (~/.local/state/eventscope/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("eventscope")
    }

    /// Returns the path of today's log file
    ///
    /// Logs rotate daily, so the file carries the UTC date as a suffix:
    /// `$XDG_STATE_HOME/eventscope/eventscope.log.YYYY-MM-DD`. Older days sit
    /// next to it under the same prefix.
    pub fn log_path() -> PathBuf {
        Self::log_path_on(Utc::now().date_naive())
    }

    /// Returns the log file path for a given UTC day.
    pub fn log_path_on(day: NaiveDate) -> PathBuf {
        Self::state_dir().join(format!("{}.{}", LOG_FILE_PREFIX, day.format("%Y-%m-%d")))
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
