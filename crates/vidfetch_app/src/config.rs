//! Layered configuration: built-in defaults, then an optional RON file,
//! then command-line/environment overrides.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;
use vidfetch_core::{Format, Quality};
use vidfetch_engine::{BackendSettings, EngineSettings, DEFAULT_BASE_URL};
use vidfetch_logging::{parse_level, vid_info, LogDestination};

use crate::cli::Cli;

pub const DEFAULT_CONFIG_FILE: &str = "vidfetch.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub retrieve_timeout_ms: u64,
    pub output_dir: PathBuf,
    pub quality: String,
    pub format: String,
    pub auto_retrieve: bool,
    pub log_level: String,
    pub log_to: String,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: 2000,
            connect_timeout_ms: 5_000,
            request_timeout_ms: 10_000,
            retrieve_timeout_ms: 300_000,
            output_dir: PathBuf::from("downloads"),
            quality: Quality::default().as_wire().to_string(),
            format: Format::default().as_str().to_string(),
            auto_retrieve: true,
            log_level: "info".to_string(),
            log_to: "file".to_string(),
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Reads `path`, or `./vidfetch.ron` if it exists, or falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        vid_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Loads the file named by `cli` (if any) and applies its overrides.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Self::load(cli.config.as_deref())?;
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(quality) = &cli.quality {
            self.quality = quality.clone();
        }
        if let Some(format) = &cli.format {
            self.format = format.clone();
        }
        if let Some(output_dir) = &cli.output_dir {
            self.output_dir = output_dir.clone();
        }
        if let Some(poll_interval_ms) = cli.poll_interval_ms {
            self.poll_interval_ms = poll_interval_ms;
        }
        if cli.no_retrieve {
            self.auto_retrieve = false;
        }
        if let Some(log_level) = &cli.log_level {
            self.log_level = log_level.clone();
        }
        if let Some(log_to) = &cli.log_to {
            self.log_to = log_to.clone();
        }
        if let Some(log_file) = &cli.log_file {
            self.log_file = Some(log_file.clone());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.quality()?;
        self.format()?;
        self.log_level()?;
        self.log_destination()?;
        for (key, value) in [
            ("poll_interval_ms", self.poll_interval_ms),
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
            ("retrieve_timeout_ms", self.retrieve_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "base_url",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn quality(&self) -> Result<Quality, ConfigError> {
        self.quality.parse().map_err(|err| ConfigError::Invalid {
            key: "quality",
            message: format!("{err}"),
        })
    }

    pub fn format(&self) -> Result<Format, ConfigError> {
        self.format.parse().map_err(|err| ConfigError::Invalid {
            key: "format",
            message: format!("{err}"),
        })
    }

    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        parse_level(&self.log_level).ok_or_else(|| ConfigError::Invalid {
            key: "log_level",
            message: format!("unknown level '{}'", self.log_level),
        })
    }

    pub fn log_destination(&self) -> Result<LogDestination, ConfigError> {
        match self.log_to.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(LogDestination::File),
            "terminal" => Ok(LogDestination::Terminal),
            "both" => Ok(LogDestination::Both),
            other => Err(ConfigError::Invalid {
                key: "log_to",
                message: format!("expected file, terminal or both, got '{other}'"),
            }),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            backend: BackendSettings {
                base_url: self.base_url.clone(),
                connect_timeout: Duration::from_millis(self.connect_timeout_ms),
                request_timeout: Duration::from_millis(self.request_timeout_ms),
                retrieve_timeout: Duration::from_millis(self.retrieve_timeout_ms),
                output_dir: self.output_dir.clone(),
            },
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}
