//! Scanpath extraction for gaze plots
//!
//! One polyline per participant and stimulus, connecting consecutive
//! fixations in fixation-index order.

use super::ColorMap;
use crate::pipeline::{order_by_fixation_index, FixationTable};
use crate::types::Condition;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanpathPoint {
    pub fixation_index: u32,
    pub x: f64,
    pub y: f64,
    /// Marker size in the gaze plot, milliseconds
    pub duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scanpath {
    pub user: String,
    pub city_map: String,
    pub condition: Condition,
    /// Legend color from the participant color map
    pub color: Option<String>,
    pub points: Vec<ScanpathPoint>,
}

/// Build scanpaths for every group in `table`.
///
/// Rows are ordered by fixation index first; groups keep the order of their
/// first row in `table`.
pub fn scanpaths(table: &FixationTable, colors: &ColorMap, prefer_normalized_x: bool) -> Vec<Scanpath> {
    let ordered = order_by_fixation_index(table);
    ordered
        .groups()
        .into_iter()
        .map(|(key, rows)| Scanpath {
            color: colors.get(&key.user).map(str::to_string),
            points: rows
                .iter()
                .map(|r| ScanpathPoint {
                    fixation_index: r.fixation_index,
                    x: r.plot_x(prefer_normalized_x),
                    y: r.mapped_y,
                    duration_ms: r.fixation_duration,
                })
                .collect(),
            user: key.user,
            city_map: key.city_map,
            condition: key.condition,
        })
        .collect()
}
