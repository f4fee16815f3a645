//! Derived views over a filtered fixation table
//!
//! Everything the dashboards plot, computed as plain data: legend colors,
//! dataset overview, duration distributions, the fixation density grid and
//! per-participant scanpaths. All functions are pure over a
//! [`FixationTable`](crate::pipeline::FixationTable).

mod catalog;
mod distribution;
mod heatmap;
mod palette;
mod scanpath;

pub use catalog::{catalog, DatasetCatalog, DurationBounds};
pub use distribution::{duration_distribution, task_duration_histogram, BoxSummary, GroupMetric, Histogram};
pub use heatmap::{density_grid, DensityGrid, GridSpec, XSource};
pub use palette::{build_color_map, ColorMap, PLOTLY_QUALITATIVE};
pub use scanpath::{scanpaths, Scanpath, ScanpathPoint};
