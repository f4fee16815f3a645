//! Fixation Aggregation & Query Pipeline
//!
//! ```text
//! LOAD   (once)      CSV -> FixationRecord -> group sums/means -> FixationTable
//! QUERY  (per call)  FixationTable + FilterSpec -> filtered view
//! ORDER  (optional)  view -> rows sorted by fixation index within each group
//! KPI    (optional)  view -> KpiReport per condition
//! ```
//!
//! The loaded table is immutable; every query returns a new view.

mod aggregation;
mod coordinator;
mod filter;
mod kpi;
mod table;

pub use aggregation::{enrich, load_and_process, GroupSummary};
pub use coordinator::Pipeline;
pub use filter::{filter_rows, order_by_fixation_index};
pub use kpi::compute_kpis;
pub use table::FixationTable;

#[cfg(test)]
pub(crate) mod testing {
    use super::{enrich, FixationTable};
    use crate::acquisition::derive_city;
    use crate::types::{Condition, FixationRecord, FixationRow};

    pub fn record(user: &str, city_map: &str, condition: Condition, index: u32, duration_ms: f64) -> FixationRecord {
        FixationRecord {
            timestamp: None,
            stimulus_name: None,
            fixation_index: index,
            fixation_duration: duration_ms,
            mapped_x: f64::from(index) * 10.0,
            mapped_y: f64::from(index) * 5.0,
            normalized_x: None,
            saccade_length: None,
            user: user.to_string(),
            city_map: city_map.to_string(),
            city: derive_city(city_map).to_string(),
            condition,
        }
    }

    /// Record wrapped without group summaries.
    pub fn row(user: &str, city_map: &str, condition: Condition, index: u32, duration_ms: f64) -> FixationRow {
        FixationRow {
            record: record(user, city_map, condition, index, duration_ms),
            task_duration_aggregated: 0.0,
            avg_fixation_duration: 0.0,
        }
    }

    /// Enriched table over the given records.
    pub fn table(records: Vec<FixationRecord>) -> FixationTable {
        FixationTable::from_rows(enrich(records))
    }
}
