//! Data acquisition module
//!
//! Reads fixation exports from disk. This is the only place the pipeline
//! touches the file system.

pub mod fixation_csv;

pub use fixation_csv::{derive_city, read_fixations, CsvOptions, DataLoadError};
