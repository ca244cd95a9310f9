//! CLI error type.

use std::fmt;
use std::path::PathBuf;

use astcpack::config::ConfigError;
use astcpack::context::quality::QualityParseError;
use astcpack::EncodeError;

/// Errors reported to the user before exiting with a failure status.
#[derive(Debug)]
pub enum CliError {
    /// Settings could not be loaded or were invalid.
    Config(String),
    /// The input image could not be decoded.
    Image { path: PathBuf, reason: String },
    /// Compression failed.
    Encode(EncodeError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Image { path, reason } => {
                write!(f, "Failed to read image {}: {}", path.display(), reason)
            }
            CliError::Encode(e) => write!(f, "Compression failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Encode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EncodeError> for CliError {
    fn from(e: EncodeError) -> Self {
        CliError::Encode(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<QualityParseError> for CliError {
    fn from(e: QualityParseError) -> Self {
        CliError::Config(format!("invalid --quality: {}", e))
    }
}
