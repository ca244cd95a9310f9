//! Compression quality presets and override resolution.
//!
//! Quality uses the engine's native 0–100 scale. A session starts from its
//! configured default; an environment variable can override it at the moment
//! a context is built. A value that does not parse falls back to the default
//! with a warning and never aborts the build.

use std::env::{self, VarError};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Fastest search, lowest quality.
pub const QUALITY_FASTEST: f32 = 0.0;
/// Fast search.
pub const QUALITY_FAST: f32 = 10.0;
/// Balanced search.
pub const QUALITY_MEDIUM: f32 = 60.0;
/// Thorough search.
pub const QUALITY_THOROUGH: f32 = 98.0;
/// Exhaustive search, highest quality.
pub const QUALITY_EXHAUSTIVE: f32 = 100.0;

/// Quality used when nothing else is configured.
pub const DEFAULT_QUALITY: f32 = QUALITY_MEDIUM;

/// Environment variable consulted for a quality override.
pub const QUALITY_ENV_VAR: &str = "ASTC_QUALITY";

/// Named quality presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityPreset {
    Fastest,
    Fast,
    Medium,
    Thorough,
    Exhaustive,
}

impl QualityPreset {
    pub fn value(&self) -> f32 {
        match self {
            QualityPreset::Fastest => QUALITY_FASTEST,
            QualityPreset::Fast => QUALITY_FAST,
            QualityPreset::Medium => QUALITY_MEDIUM,
            QualityPreset::Thorough => QUALITY_THOROUGH,
            QualityPreset::Exhaustive => QUALITY_EXHAUSTIVE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QualityPreset::Fastest => "fastest",
            QualityPreset::Fast => "fast",
            QualityPreset::Medium => "medium",
            QualityPreset::Thorough => "thorough",
            QualityPreset::Exhaustive => "exhaustive",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "fastest" => Some(QualityPreset::Fastest),
            "fast" => Some(QualityPreset::Fast),
            "medium" => Some(QualityPreset::Medium),
            "thorough" => Some(QualityPreset::Thorough),
            "exhaustive" => Some(QualityPreset::Exhaustive),
            _ => None,
        }
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors produced when a quality string is not usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QualityParseError {
    #[error("quality value is empty")]
    Empty,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("'{0}' is not a finite number")]
    NotFinite(String),

    #[error("quality override is not valid unicode")]
    NotUnicode,
}

/// Parse a numeric quality value.
///
/// Surrounding whitespace is ignored; anything else that is not a finite
/// floating-point number is rejected.
pub fn parse_quality(raw: &str) -> Result<f32, QualityParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(QualityParseError::Empty);
    }

    let value =
        f32::from_str(trimmed).map_err(|_| QualityParseError::NotANumber(trimmed.to_string()))?;
    if !value.is_finite() {
        return Err(QualityParseError::NotFinite(trimmed.to_string()));
    }

    Ok(value)
}

/// Parse either a preset name (`"thorough"`) or a numeric quality (`"75"`).
pub fn parse_quality_or_preset(raw: &str) -> Result<f32, QualityParseError> {
    match QualityPreset::from_name(raw.trim()) {
        Some(preset) => Ok(preset.value()),
        None => parse_quality(raw),
    }
}

/// Where a resolved quality came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityOrigin {
    /// No override was present.
    Default,
    /// The override parsed successfully.
    Override,
    /// An override was present but unusable; the default was used.
    Fallback(QualityParseError),
}

/// Quality chosen for a context build.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuality {
    pub value: f32,
    pub origin: QualityOrigin,
}

/// Resolve quality from a default and an optional raw override.
pub fn resolve_quality(default: f32, override_value: Option<&str>) -> ResolvedQuality {
    match override_value.map(parse_quality) {
        None => ResolvedQuality {
            value: default,
            origin: QualityOrigin::Default,
        },
        Some(Ok(value)) => ResolvedQuality {
            value,
            origin: QualityOrigin::Override,
        },
        Some(Err(e)) => fallback(default, e),
    }
}

/// Resolve quality from a default and the environment variable `var`.
///
/// `None` disables the override.
pub fn resolve_quality_from_env(default: f32, var: Option<&str>) -> ResolvedQuality {
    let Some(var) = var else {
        return resolve_quality(default, None);
    };

    match env::var(var) {
        Ok(raw) => {
            let resolved = resolve_quality(default, Some(&raw));
            if resolved.origin == QualityOrigin::Override {
                tracing::debug!(var, quality = resolved.value, "Quality override applied");
            } else {
                tracing::warn!(var, default, "Failed to parse quality override, using default");
            }
            resolved
        }
        Err(VarError::NotPresent) => resolve_quality(default, None),
        Err(VarError::NotUnicode(_)) => {
            tracing::warn!(var, default, "Quality override is not valid unicode, using default");
            fallback(default, QualityParseError::NotUnicode)
        }
    }
}

fn fallback(default: f32, error: QualityParseError) -> ResolvedQuality {
    ResolvedQuality {
        value: default,
        origin: QualityOrigin::Fallback(error),
    }
}
