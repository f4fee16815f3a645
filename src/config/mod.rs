//! Gazemap Configuration Module
//!
//! Rendering and ingestion settings loaded from TOML. Every field has a
//! built-in default, so a missing file changes nothing.
//!
//! ## Loading Order
//!
//! 1. Explicit path (the `--config` flag)
//! 2. `GAZEMAP_CONFIG` environment variable (path to TOML file)
//! 3. `gazemap.toml` in the current working directory
//! 4. Built-in defaults
//!
//! The loaded [`GazeConfig`] is passed by reference to whatever needs it;
//! there is no process-wide instance.
//!
//! ```ignore
//! let config = GazeConfig::load(cli.config.as_deref())?;
//! let pipeline = Pipeline::load(&data_path, config.csv_options())?;
//! ```

mod gaze_config;
pub mod defaults;
pub mod validation;

pub use gaze_config::*;
