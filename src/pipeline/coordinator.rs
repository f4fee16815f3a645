//! Pipeline façade
//!
//! Owns the table produced by the one-time load and answers queries against
//! it. Cloning a `Pipeline` is cheap and clones share the same rows, so a
//! serving layer can hand one to every reader.

use super::{compute_kpis, filter_rows, load_and_process, order_by_fixation_index, FixationTable};
use crate::acquisition::{CsvOptions, DataLoadError};
use crate::types::{FilterSpec, KpiReport};
use std::path::{Path, PathBuf};

/// Loaded fixation data plus the query operations over it.
#[derive(Debug, Clone)]
pub struct Pipeline {
    source: Option<PathBuf>,
    table: FixationTable,
}

impl Pipeline {
    /// Load and enrich a fixation export.
    pub fn load(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self, DataLoadError> {
        let path = path.as_ref();
        let table = load_and_process(path, options)?;
        Ok(Self {
            source: Some(path.to_path_buf()),
            table,
        })
    }

    /// Wrap an already built table.
    pub fn from_table(table: FixationTable) -> Self {
        Self { source: None, table }
    }

    /// File the table was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The full loaded table.
    pub fn table(&self) -> &FixationTable {
        &self.table
    }

    /// Rows matching `spec`, in load order.
    pub fn query(&self, spec: &FilterSpec) -> FixationTable {
        filter_rows(&self.table, spec)
    }

    /// Rows matching `spec`, ordered for scanpath drawing.
    pub fn query_ordered(&self, spec: &FilterSpec) -> FixationTable {
        order_by_fixation_index(&self.query(spec))
    }

    /// KPI report over the rows matching `spec`.
    pub fn kpis(&self, spec: &FilterSpec) -> KpiReport {
        compute_kpis(&self.query(spec))
    }
}
