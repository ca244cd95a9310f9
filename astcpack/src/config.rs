//! Encoder settings and INI configuration loading.
//!
//! Settings can be built in code or loaded from the `[encoder]` section of an
//! INI file:
//!
//! ```ini
//! [encoder]
//! ; number or preset name (fastest, fast, medium, thorough, exhaustive)
//! quality = thorough
//! ; "auto" uses the detected hardware concurrency
//! jobs = auto
//! ; environment variable that overrides quality, or "none" to disable
//! quality_env = ASTC_QUALITY
//! ```

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::context::quality::{parse_quality_or_preset, DEFAULT_QUALITY, QUALITY_ENV_VAR};

/// INI section holding encoder settings.
pub const CONFIG_SECTION: &str = "encoder";

/// Directory under the home directory holding the config file.
pub const CONFIG_DIR_NAME: &str = ".astcpack";

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors that can occur while loading settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// How many jobs (and worker threads) a context is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobCount {
    /// One job per hardware thread.
    #[default]
    Hardware,
    /// An explicit job count.
    Fixed(usize),
}

impl JobCount {
    /// Resolve to a concrete job count, never less than 1.
    pub fn resolve(&self) -> usize {
        let reported = match self {
            JobCount::Hardware => detect_hardware_concurrency(),
            JobCount::Fixed(n) => *n,
        };
        floor_job_count(reported)
    }
}

/// Detected hardware concurrency, or 0 when it cannot be determined.
pub fn detect_hardware_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(0)
}

/// Never run fewer than one job.
pub fn floor_job_count(reported: usize) -> usize {
    reported.max(1)
}

/// Settings for an encoder session.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderSettings {
    /// Quality used when no override applies.
    pub quality: f32,
    /// Environment variable that overrides `quality` at context build time.
    pub quality_env: Option<String>,
    /// Job count for new contexts.
    pub jobs: JobCount,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            quality_env: Some(QUALITY_ENV_VAR.to_string()),
            jobs: JobCount::Hardware,
        }
    }
}

impl EncoderSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default quality.
    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    /// Read the quality override from `var` instead of `ASTC_QUALITY`.
    pub fn with_quality_env(mut self, var: impl Into<String>) -> Self {
        self.quality_env = Some(var.into());
        self
    }

    /// Ignore the environment entirely.
    pub fn without_quality_env(mut self) -> Self {
        self.quality_env = None;
        self
    }

    /// Set the job count.
    pub fn with_jobs(mut self, jobs: JobCount) -> Self {
        self.jobs = jobs;
        self
    }

    /// Parse settings from INI text. Missing keys keep their defaults.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }

    /// Load settings from an INI file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "Loaded encoder config");
        Self::from_ini(&ini)
    }

    /// Load settings from the default config path if the file exists.
    pub fn load_default() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut settings = Self::default();
        let Some(section) = ini.section(Some(CONFIG_SECTION)) else {
            return Ok(settings);
        };

        for (key, value) in section.iter() {
            match key {
                "quality" => {
                    settings.quality = parse_quality_or_preset(value)
                        .map_err(|e| invalid(key, value, e.to_string()))?;
                }
                "jobs" => settings.jobs = parse_jobs(value)?,
                "quality_env" => {
                    let value = value.trim();
                    settings.quality_env = if value.eq_ignore_ascii_case("none") {
                        None
                    } else if value.is_empty() {
                        return Err(invalid(key, value, "variable name is empty"));
                    } else {
                        Some(value.to_string())
                    };
                }
                _ => tracing::warn!(key, section = CONFIG_SECTION, "Ignoring unknown config key"),
            }
        }

        Ok(settings)
    }
}

fn parse_jobs(value: &str) -> Result<JobCount, ConfigError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("auto") {
        return Ok(JobCount::Hardware);
    }
    trimmed
        .parse::<usize>()
        .map(JobCount::Fixed)
        .map_err(|_| invalid("jobs", value, "expected 'auto' or a whole number"))
}

fn invalid(key: &str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Default config file location: `~/.astcpack/config.ini`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
