//! Gazemap: Eye-Tracking Fixation Analysis
//!
//! Loads a fixation export once, enriches every fixation with its group's
//! task duration and mean fixation duration, then answers filter, ordering,
//! KPI and plot-data queries against the immutable result.
//!
//! ## Architecture
//!
//! - **Acquisition**: strict `;`-separated CSV ingestion
//! - **Pipeline**: group aggregation/join, filtering, ordering, KPIs
//! - **Analysis**: color map, catalog, distributions, density grid, scanpaths
//! - **Config**: TOML settings with typo warnings and range checks

pub mod acquisition;
pub mod analysis;
pub mod config;
pub mod pipeline;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, GazeConfig};

// Re-export commonly used types
pub use types::{
    Condition, ConditionKpis, DurationRange, DurationTarget, FilterSpec, FixationRecord, FixationRow,
    GreyLabel, GroupKey, KpiReport, KpiValue, LocationFilter, UndefinedAggregate, UserSelection,
};

// Re-export the pipeline
pub use acquisition::{CsvOptions, DataLoadError};
pub use pipeline::{compute_kpis, filter_rows, load_and_process, order_by_fixation_index, FixationTable, Pipeline};

// Re-export analysis entry points
pub use analysis::{build_color_map, catalog, density_grid, duration_distribution, scanpaths, task_duration_histogram};
