//! KPI computation over a filtered table
//!
//! Per condition:
//! - average task duration: total fixation time / distinct participants, s
//! - fixation points: row count
//! - average saccade length: mean over rows reporting one
//! - average fixation duration: mean of row durations, s
//!
//! Any mean with an empty denominator is reported as unavailable.

use super::FixationTable;
use crate::types::{Condition, ConditionKpis, FixationRow, KpiReport, KpiValue, MS_PER_SECOND};
use statrs::statistics::Statistics;
use std::collections::BTreeSet;

/// Compute the KPI report for both conditions of `table`.
pub fn compute_kpis(table: &FixationTable) -> KpiReport {
    let report = KpiReport::new(Condition::ALL.into_iter().map(|condition| {
        let rows: Vec<&FixationRow> = table.iter().filter(|r| r.condition == condition).collect();
        condition_kpis(condition, &rows)
    }));
    tracing::debug!(
        rows = table.len(),
        color_points = report.color().fixation_points,
        grey_points = report.grey().fixation_points,
        "KPIs computed"
    );
    report
}

fn condition_kpis(condition: Condition, rows: &[&FixationRow]) -> ConditionKpis {
    if rows.is_empty() {
        return ConditionKpis::empty(condition);
    }

    let participants = rows.iter().map(|r| r.user.as_str()).collect::<BTreeSet<_>>().len();
    let total_ms: f64 = rows.iter().map(|r| r.fixation_duration).sum();

    let saccades: Vec<f64> = rows.iter().filter_map(|r| r.saccade_length).collect();
    let avg_saccade_length = if saccades.is_empty() {
        KpiValue::Unavailable
    } else {
        KpiValue::from_f64(saccades.iter().mean())
    };

    let durations: Vec<f64> = rows.iter().map(|r| r.fixation_duration).collect();
    let avg_fixation_duration = KpiValue::from_f64(durations.iter().mean()).map(|ms| ms / MS_PER_SECOND);

    ConditionKpis {
        condition,
        participants,
        avg_task_duration: KpiValue::ratio(total_ms, participants).map(|ms| ms / MS_PER_SECOND),
        fixation_points: rows.len(),
        avg_saccade_length,
        avg_fixation_duration,
    }
}
