//! Gazemap Configuration - ingestion, filter and rendering settings as TOML
//!
//! Each section struct implements `Default` with the values the dashboards
//! were built around, so a partial file only overrides what it names.

use super::defaults;
use crate::acquisition::CsvOptions;
use crate::analysis::{GridSpec, XSource, PLOTLY_QUALITATIVE};
use crate::types::{DurationRange, DurationTarget, GreyLabel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with [`GazeConfig::load`], which searches an explicit path,
/// `$GAZEMAP_CONFIG`, `./gazemap.toml` and finally the built-in defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GazeConfig {
    /// Input file and separator
    #[serde(default)]
    pub data: DataConfig,

    /// Condition labels
    #[serde(default)]
    pub conditions: ConditionsConfig,

    /// Default duration filter
    #[serde(default)]
    pub filter: FilterConfig,

    /// Participant legend colors
    #[serde(default)]
    pub palette: PaletteConfig,

    /// Density grid over the stimulus
    #[serde(default)]
    pub heatmap: HeatmapConfig,

    /// Task-duration histogram
    #[serde(default)]
    pub histogram: HistogramConfig,
}

impl GazeConfig {
    /// Load configuration using the standard search order:
    /// 1. `explicit` path, when given (must exist)
    /// 2. `$GAZEMAP_CONFIG` environment variable
    /// 3. `./gazemap.toml` in the current working directory
    /// 4. Built-in defaults
    ///
    /// A file that is found but fails to parse or validate is an error; it is
    /// never silently replaced by defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load_from_file(path)?;
            info!(path = %path.display(), "Loaded config from --config");
            return Ok(config);
        }

        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                let config = Self::load_from_file(&p)?;
                info!(path = %p.display(), "Loaded config from {}", defaults::CONFIG_ENV_VAR);
                return Ok(config);
            }
            warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            let config = Self::load_from_file(&local)?;
            info!("Loaded config from ./{}", defaults::LOCAL_CONFIG_FILE);
            return Ok(config);
        }

        info!("No {} found, using built-in defaults", defaults::LOCAL_CONFIG_FILE);
        Ok(Self::default())
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        // Unknown keys only warn
        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Reject values no query can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Reader options for the configured separator.
    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            delimiter: u8::try_from(self.data.delimiter).unwrap_or(b';'),
        }
    }

    /// Density grid settings.
    pub fn grid_spec(&self) -> GridSpec {
        let h = &self.heatmap;
        GridSpec {
            bins_x: h.bins_x,
            bins_y: h.bins_y,
            width: h.width,
            height: h.height,
            x_source: h.x_source,
        }
    }

    /// Default duration range: the configured target with the configured
    /// bounds, open where a bound is unset.
    pub fn default_duration_range(&self) -> Option<DurationRange> {
        self.filter.duration_range()
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Fixation export to load when `--data` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Field separator, one of `;` `,` tab `|`
    pub delimiter: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: None,
            delimiter: defaults::DELIMITER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionsConfig {
    /// Output spelling of the greyscale condition
    pub grey_label: GreyLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Field the `--min`/`--max` bounds compare against
    pub duration_target: DurationTarget,
    /// Lower bound applied when the CLI gives none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound applied when the CLI gives none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl FilterConfig {
    /// Copy with the given target and bounds replacing the configured ones.
    pub fn overridden_by(&self, target: Option<DurationTarget>, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            duration_target: target.unwrap_or(self.duration_target),
            min: min.or(self.min),
            max: max.or(self.max),
        }
    }

    /// Range over the configured target, open where a bound is unset.
    /// `None` when neither bound is set.
    pub fn duration_range(&self) -> Option<DurationRange> {
        if self.min.is_none() && self.max.is_none() {
            return None;
        }
        Some(DurationRange::from_bounds(self.duration_target, self.min, self.max))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Colors assigned round-robin over sorted participants
    pub colors: Vec<String>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            colors: PLOTLY_QUALITATIVE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    pub bins_x: usize,
    pub bins_y: usize,
    /// Stimulus width (px)
    pub width: f64,
    /// Stimulus height (px)
    pub height: f64,
    pub x_source: XSource,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            bins_x: defaults::HEATMAP_BINS,
            bins_y: defaults::HEATMAP_BINS,
            width: defaults::STIMULUS_WIDTH_PX,
            height: defaults::STIMULUS_HEIGHT_PX,
            x_source: XSource::Normalized,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub bins: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            bins: defaults::HISTOGRAM_BINS,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = GazeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.csv_options().delimiter, b';');
        assert_eq!(config.palette.colors.len(), 10);
        assert_eq!(config.grid_spec(), GridSpec::default());
        assert_eq!(config.default_duration_range(), None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_str = r#"
[conditions]
grey_label = "gray"

[heatmap]
bins_x = 40
"#;
        let config: GazeConfig = toml::from_str(toml_str).expect("partial TOML should parse");
        assert_eq!(config.conditions.grey_label, GreyLabel::Gray);
        assert_eq!(config.heatmap.bins_x, 40);
        assert_eq!(config.heatmap.bins_y, 20);
        assert_eq!(config.histogram.bins, 20);
        assert_eq!(config.data.delimiter, ';');
    }

    #[test]
    fn test_filter_section() {
        let toml_str = r#"
[filter]
duration_target = "fixation"
min = 100.0
"#;
        let config: GazeConfig = toml::from_str(toml_str).expect("filter TOML should parse");
        let range = config.default_duration_range().expect("min set");
        assert_eq!(range.target, DurationTarget::Fixation);
        assert_eq!(range.min, 100.0);
        assert_eq!(range.max, f64::INFINITY);
    }

    #[test]
    fn test_filter_override_keeps_unset_fields() {
        let base = FilterConfig {
            duration_target: DurationTarget::Fixation,
            min: Some(100.0),
            max: Some(900.0),
        };
        let merged = base.overridden_by(None, None, Some(400.0));
        assert_eq!(merged.duration_target, DurationTarget::Fixation);
        assert_eq!((merged.min, merged.max), (Some(100.0), Some(400.0)));

        let task = base.overridden_by(Some(DurationTarget::Task), Some(5.0), None);
        let range = task.duration_range().expect("bounds set");
        assert_eq!(range.target, DurationTarget::Task);
        assert_eq!((range.min, range.max), (5.0, 900.0));
    }

    #[test]
    fn test_load_from_file_rejects_zero_bins() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[histogram]\nbins = 0").expect("write");
        match GazeConfig::load_from_file(file.path()) {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("histogram.bins")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[data]\ndelimiter = \",\"\npath = \"fixations.csv\"").expect("write");
        let config = GazeConfig::load(Some(file.path())).expect("explicit config loads");
        assert_eq!(config.csv_options().delimiter, b',');
        assert_eq!(config.data.path.as_deref(), Some(Path::new("fixations.csv")));
    }

    #[test]
    fn test_load_explicit_missing_file_is_error() {
        let result = GazeConfig::load(Some(Path::new("/nonexistent/gazemap.toml")));
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }

    #[test]
    fn test_parse_error_names_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[heatmap]\nbins_x = \"many\"").expect("write");
        let err = GazeConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(..)));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_roundtrip_toml() {
        let mut original = GazeConfig::default();
        original.heatmap.x_source = XSource::Mapped;
        original.filter.max = Some(30.0);
        let toml_str = original.to_toml().expect("serialization should work");
        let roundtripped: GazeConfig = toml::from_str(&toml_str).expect("deserialization should work");
        assert_eq!(original, roundtripped);
    }
}
