//! Group Aggregation & Join
//!
//! Computes the per-`(user, cityMap, condition)` summaries once at load time
//! and joins them back onto every record:
//!
//! - `task_duration_aggregated` = sum(FixationDuration) / 1000 (seconds)
//! - `avg_fixation_duration` = mean(FixationDuration) / 1000 (seconds)

use super::FixationTable;
use crate::acquisition::{read_fixations, CsvOptions, DataLoadError};
use crate::types::{Condition, FixationRecord, FixationRow, MS_PER_SECOND};
use std::collections::HashMap;
use std::path::Path;

/// Running totals for one `(user, cityMap, condition)` group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupSummary {
    pub fixation_count: usize,
    pub total_duration_ms: f64,
}

impl GroupSummary {
    fn add(&mut self, duration_ms: f64) {
        self.fixation_count += 1;
        self.total_duration_ms += duration_ms;
    }

    /// Summed fixation duration, seconds.
    pub fn task_duration_s(&self) -> f64 {
        self.total_duration_ms / MS_PER_SECOND
    }

    /// Mean fixation duration, seconds. Zero for an empty group.
    pub fn avg_fixation_duration_s(&self) -> f64 {
        if self.fixation_count == 0 {
            0.0
        } else {
            self.total_duration_ms / self.fixation_count as f64 / MS_PER_SECOND
        }
    }
}

/// Join the group summaries onto each record, preserving record order.
pub fn enrich(records: Vec<FixationRecord>) -> Vec<FixationRow> {
    let joined: Vec<(f64, f64)> = {
        let mut summaries: HashMap<(&str, &str, Condition), GroupSummary> = HashMap::new();
        for r in &records {
            summaries
                .entry((r.user.as_str(), r.city_map.as_str(), r.condition))
                .or_default()
                .add(r.fixation_duration);
        }

        records
            .iter()
            .map(|r| {
                let s = summaries
                    .get(&(r.user.as_str(), r.city_map.as_str(), r.condition))
                    .copied()
                    .unwrap_or_default();
                (s.task_duration_s(), s.avg_fixation_duration_s())
            })
            .collect()
    };

    records
        .into_iter()
        .zip(joined)
        .map(|(record, (task_duration_aggregated, avg_fixation_duration))| FixationRow {
            record,
            task_duration_aggregated,
            avg_fixation_duration,
        })
        .collect()
}

/// Load a fixation export and build the enriched, immutable table.
///
/// This is the single entry point that reads from disk. Either the whole
/// file becomes a table or the call fails.
pub fn load_and_process(path: impl AsRef<Path>, options: CsvOptions) -> Result<FixationTable, DataLoadError> {
    let path = path.as_ref();
    let records = read_fixations(path, options)?;
    let rows = enrich(records);
    let table = FixationTable::from_rows(rows);

    tracing::info!(
        file = %path.display(),
        rows = table.len(),
        groups = table.groups().len(),
        users = table.users().len(),
        "Fixation data loaded"
    );

    Ok(table)
}
