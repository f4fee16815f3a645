//! Config validation: unknown-key detection with Levenshtein suggestions
//! and value range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Unknown keys never fail a load.

use super::{defaults, FilterConfig, GazeConfig};
use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for GazeConfig.
///
/// Maintained by hand alongside the section structs in gaze_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [data]
        "data",
        "data.path",
        "data.delimiter",
        // [conditions]
        "conditions",
        "conditions.grey_label",
        // [filter]
        "filter",
        "filter.duration_target",
        "filter.min",
        "filter.max",
        // [palette]
        "palette",
        "palette.colors",
        // [heatmap]
        "heatmap",
        "heatmap.bins_x",
        "heatmap.bins_y",
        "heatmap.width",
        "heatmap.height",
        "heatmap.x_source",
        // [histogram]
        "histogram",
        "histogram.bins",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Edit distance between two strings, counted in chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties go to the alphabetically first key so the suggestion is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|&(dist, _)| dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are reported by serde
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Validate values on a parsed GazeConfig.
///
/// Returns (errors, warnings). Errors are values no query can run with;
/// warnings are suspicious but usable.
pub fn validate_ranges(config: &GazeConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let delimiter = config.data.delimiter;
    if !defaults::SUPPORTED_DELIMITERS.contains(&delimiter) {
        errors.push(format!(
            "data.delimiter = {delimiter:?} is not supported (use one of {:?})",
            defaults::SUPPORTED_DELIMITERS
        ));
    }

    // Palette: at least one usable color
    let colors = &config.palette.colors;
    if colors.is_empty() {
        errors.push("palette.colors must list at least one color".to_string());
    } else if let Some(pos) = colors.iter().position(|c| c.trim().is_empty()) {
        errors.push(format!("palette.colors[{pos}] is blank"));
    }

    let h = &config.heatmap;
    for (field, bins) in [("heatmap.bins_x", h.bins_x), ("heatmap.bins_y", h.bins_y)] {
        if bins == 0 {
            errors.push(format!("{field} must be > 0"));
        } else if bins > defaults::HEATMAP_BINS_WARN {
            warnings.push(ValidationWarning {
                field: field.to_string(),
                message: format!(
                    "{field} = {bins} is unusually fine (> {} bins)",
                    defaults::HEATMAP_BINS_WARN
                ),
                suggestion: None,
            });
        }
    }
    for (field, extent) in [("heatmap.width", h.width), ("heatmap.height", h.height)] {
        if !extent.is_finite() || extent <= 0.0 {
            errors.push(format!("{field} = {extent} must be a positive pixel extent"));
        }
    }

    if let Err(e) = check_histogram_bins("histogram.bins", config.histogram.bins) {
        errors.push(e);
    }

    errors.extend(filter_bound_errors(&config.filter));

    (errors, warnings)
}

/// Histogram bin count must be in `1..=HISTOGRAM_BINS_MAX`.
pub fn check_histogram_bins(field: &str, bins: usize) -> Result<(), String> {
    if bins == 0 {
        Err(format!("{field} must be > 0"))
    } else if bins > defaults::HISTOGRAM_BINS_MAX {
        Err(format!("{field} = {bins} exceeds the maximum of {}", defaults::HISTOGRAM_BINS_MAX))
    } else {
        Ok(())
    }
}

/// Duration filter bounds must be finite, non-negative and not inverted.
pub fn filter_bound_errors(filter: &FilterConfig) -> Vec<String> {
    let mut errors = Vec::new();
    for (field, bound) in [("filter.min", filter.min), ("filter.max", filter.max)] {
        if let Some(v) = bound {
            if !v.is_finite() {
                errors.push(format!("{field} = {v} must be finite"));
            } else if v < 0.0 {
                errors.push(format!("{field} = {v} cannot be negative"));
            }
        }
    }
    if let (Some(min), Some(max)) = (filter.min, filter.max) {
        if min > max {
            errors.push(format!("filter.min ({min}) must be <= filter.max ({max})"));
        }
    }
    errors
}

// ============================================================================
// Tests
// ============================================================================
