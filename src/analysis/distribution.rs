//! Duration distributions per city and condition
//!
//! Summaries are taken over one sample per `(user, cityMap, condition)`
//! group, so a participant with many fixations does not outweigh one with few.
//! Quartiles interpolate linearly between order statistics (numpy's default,
//! which is also what Plotly box plots draw).

use crate::pipeline::FixationTable;
use crate::types::Condition;
use crate::config::defaults;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics, Statistics};
use std::collections::BTreeMap;

/// Which per-group summary field to distribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMetric {
    /// `task_duration_aggregated`, seconds
    #[default]
    TaskDuration,
    /// `avg_fixation_duration`, seconds
    AvgFixationDuration,
}

impl GroupMetric {
    pub fn label(self) -> &'static str {
        match self {
            GroupMetric::TaskDuration => "Task Duration [sec.]",
            GroupMetric::AvgFixationDuration => "Average Fixation Duration [sec.]",
        }
    }
}

/// Five-number summary plus mean of one `(city, condition)` sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub city: String,
    pub condition: Condition,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

/// Equal-width histogram of per-group task durations for one condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub condition: Condition,
    /// `counts.len() + 1` edges; empty when there are no samples
    pub bin_edges: Vec<f64>,
    pub counts: Vec<usize>,
    pub total: usize,
}

/// One value of `metric` per group, keyed by `(city, condition)`.
fn group_samples(table: &FixationTable, metric: GroupMetric) -> BTreeMap<(String, Condition), Vec<f64>> {
    let mut samples: BTreeMap<(String, Condition), Vec<f64>> = BTreeMap::new();
    for (key, rows) in table.groups() {
        let Some(first) = rows.first() else { continue };
        let value = match metric {
            GroupMetric::TaskDuration => first.task_duration_aggregated,
            GroupMetric::AvgFixationDuration => first.avg_fixation_duration,
        };
        samples.entry((first.city.clone(), key.condition)).or_default().push(value);
    }
    samples
}

/// Quantile `tau` by linear interpolation between the two nearest order
/// statistics (Hyndman-Fan type 7). `data` must be non-empty.
fn quantile_linear(data: &mut Data<Vec<f64>>, tau: f64) -> f64 {
    let n = data.len();
    let h = tau.clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = h.floor() as usize;
    let below = data.order_statistic(lo + 1);
    if lo + 1 >= n {
        return below;
    }
    let above = data.order_statistic(lo + 2);
    below + (h - lo as f64) * (above - below)
}

fn summarize(city: String, condition: Condition, values: Vec<f64>) -> BoxSummary {
    let count = values.len();
    let mean = values.iter().mean();

    let mut data = Data::new(values);
    BoxSummary {
        city,
        condition,
        count,
        min: data.order_statistic(1),
        q1: quantile_linear(&mut data, 0.25),
        median: quantile_linear(&mut data, 0.5),
        q3: quantile_linear(&mut data, 0.75),
        max: data.order_statistic(count),
        mean,
    }
}

/// Box-plot summaries of `metric` for every `(city, condition)` pair present,
/// sorted by city then condition.
pub fn duration_distribution(table: &FixationTable, metric: GroupMetric) -> Vec<BoxSummary> {
    group_samples(table, metric)
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|((city, condition), values)| summarize(city, condition, values))
        .collect()
}

/// Per-condition histograms of per-group task durations.
///
/// Always returns one histogram per condition; `bins` is clamped to
/// `1..=HISTOGRAM_BINS_MAX`.
pub fn task_duration_histogram(table: &FixationTable, bins: usize) -> Vec<Histogram> {
    let bins = bins.clamp(1, defaults::HISTOGRAM_BINS_MAX);
    let mut by_condition: BTreeMap<Condition, Vec<f64>> = BTreeMap::new();
    for ((_, condition), values) in group_samples(table, GroupMetric::TaskDuration) {
        by_condition.entry(condition).or_default().extend(values);
    }

    Condition::ALL
        .into_iter()
        .map(|condition| {
            let values = by_condition.remove(&condition).unwrap_or_default();
            histogram(condition, &values, bins)
        })
        .collect()
}

fn histogram(condition: Condition, values: &[f64], bins: usize) -> Histogram {
    if values.is_empty() {
        return Histogram {
            condition,
            bin_edges: Vec::new(),
            counts: Vec::new(),
            total: 0,
        };
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    // All samples equal: a single bin holds everything
    let bins = if max > min { bins } else { 1 };
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let bin_edges = (0..=bins)
        .map(|i| if i == bins && max > min { max } else { min + width * i as f64 })
        .collect();

    Histogram {
        condition,
        bin_edges,
        counts,
        total: values.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{record, table};

    fn sample() -> FixationTable {
        table(vec![
            // Antwerpen color: group totals 1, 2, 3, 4, 5 s
            record("P1", "Antwerpen_S1", Condition::Color, 1, 1000.0),
            record("P2", "Antwerpen_S1", Condition::Color, 1, 1000.0),
            record("P2", "Antwerpen_S1", Condition::Color, 2, 1000.0),
            record("P3", "Antwerpen_S1", Condition::Color, 1, 3000.0),
            record("P4", "Antwerpen_S2", Condition::Color, 1, 4000.0),
            record("P5", "Antwerpen_S2", Condition::Color, 1, 5000.0),
            // Antwerpen grey: one group of 0.5 s
            record("P1", "Antwerpen_S1", Condition::Grey, 1, 500.0),
            // Basel color
            record("P1", "Basel_S1", Condition::Color, 1, 2000.0),
        ])
    }

    #[test]
    fn test_one_sample_per_group() {
        let boxes = duration_distribution(&sample(), GroupMetric::TaskDuration);
        assert_eq!(boxes.len(), 3);

        let antwerpen = &boxes[0];
        assert_eq!((antwerpen.city.as_str(), antwerpen.condition), ("Antwerpen", Condition::Color));
        // P2's two rows contribute a single 2 s sample
        assert_eq!(antwerpen.count, 5);
        assert_eq!(antwerpen.min, 1.0);
        assert_eq!(antwerpen.max, 5.0);
        assert!((antwerpen.median - 3.0).abs() < 1e-9);
        assert!((antwerpen.mean - 3.0).abs() < 1e-9);
        // Linear quartiles over 1..=5 s
        assert!((antwerpen.q1 - 2.0).abs() < 1e-9, "q1 = {}", antwerpen.q1);
        assert!((antwerpen.q3 - 4.0).abs() < 1e-9, "q3 = {}", antwerpen.q3);

        assert_eq!((boxes[1].city.as_str(), boxes[1].condition), ("Antwerpen", Condition::Grey));
        assert_eq!(boxes[2].city, "Basel");
    }

    #[test]
    fn test_avg_fixation_metric() {
        let boxes = duration_distribution(&sample(), GroupMetric::AvgFixationDuration);
        let antwerpen = &boxes[0];
        // P2 averages 1 s per fixation
        assert_eq!(antwerpen.min, 1.0);
        assert_eq!(antwerpen.max, 5.0);
    }

    #[test]
    fn test_histogram_bins() {
        let t = crate::pipeline::filter_rows(&sample(), &crate::types::FilterSpec::all().city("Antwerpen"));
        let hists = task_duration_histogram(&t, 4);
        assert_eq!(hists.len(), 2);

        let color = &hists[0];
        assert_eq!(color.condition, Condition::Color);
        assert_eq!(color.total, 5);
        assert_eq!(color.counts.iter().sum::<usize>(), 5);
        assert_eq!(color.bin_edges, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        // 5 s lands in the last bin
        assert_eq!(color.counts, vec![1, 1, 1, 2]);

        let grey = &hists[1];
        assert_eq!(grey.counts, vec![1]);
        assert_eq!(grey.bin_edges, vec![0.5, 1.5]);
    }

    #[test]
    fn test_linear_quartiles_interpolate() {
        let mut data = Data::new(vec![4.0, 1.0, 3.0, 2.0]);
        assert!((quantile_linear(&mut data, 0.25) - 1.75).abs() < 1e-9);
        assert!((quantile_linear(&mut data, 0.5) - 2.5).abs() < 1e-9);
        assert!((quantile_linear(&mut data, 0.75) - 3.25).abs() < 1e-9);
        assert_eq!(quantile_linear(&mut Data::new(vec![7.0]), 0.75), 7.0);
    }

    #[test]
    fn test_single_group_box() {
        let boxes = duration_distribution(&sample(), GroupMetric::TaskDuration);
        let basel = &boxes[2];
        assert_eq!(basel.count, 1);
        assert_eq!((basel.min, basel.q1, basel.median, basel.q3, basel.max), (2.0, 2.0, 2.0, 2.0, 2.0));
    }

    #[test]
    fn test_histogram_bins_are_capped() {
        let hists = task_duration_histogram(&sample(), usize::MAX);
        let color = &hists[0];
        assert_eq!(color.counts.len(), defaults::HISTOGRAM_BINS_MAX);
        assert_eq!(color.bin_edges.len(), defaults::HISTOGRAM_BINS_MAX + 1);
        assert_eq!(color.counts.iter().sum::<usize>(), color.total);
    }

    #[test]
    fn test_histogram_empty_input() {
        let hists = task_duration_histogram(&FixationTable::empty(), 10);
        assert_eq!(hists.len(), 2);
        assert!(hists.iter().all(|h| h.total == 0 && h.counts.is_empty()));
    }
}
