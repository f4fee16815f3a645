//! Built-in configuration defaults.
//!
//! Grouped by config section. Values reproduce the original dashboards.

// ============================================================================
// Loading
// ============================================================================

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "GAZEMAP_CONFIG";

/// Config file picked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "gazemap.toml";

// ============================================================================
// Data
// ============================================================================

/// Field separator of the eye-tracker export.
pub const DELIMITER: char = ';';

/// Separators the reader accepts.
pub const SUPPORTED_DELIMITERS: [char; 4] = [';', ',', '\t', '|'];

// ============================================================================
// Heat map
// ============================================================================

/// Density grid resolution along each axis.
pub const HEATMAP_BINS: usize = 20;

/// Stimulus image width (px).
pub const STIMULUS_WIDTH_PX: f64 = 1960.0;

/// Stimulus image height (px).
pub const STIMULUS_HEIGHT_PX: f64 = 1200.0;

/// Grid resolution above which a warning is emitted.
pub const HEATMAP_BINS_WARN: usize = 500;

// ============================================================================
// Histogram
// ============================================================================

/// Task-duration histogram bin count.
pub const HISTOGRAM_BINS: usize = 20;

/// Largest bin count a histogram may request.
pub const HISTOGRAM_BINS_MAX: usize = 1000;
