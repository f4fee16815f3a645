//! KPI report types

use super::Condition;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A KPI whose denominator was zero.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kpi} is undefined for {condition}: no samples")]
pub struct UndefinedAggregate {
    pub kpi: &'static str,
    pub condition: Condition,
}

/// A guarded aggregate: either a finite number or explicitly unavailable.
///
/// Serializes as a number or `null`; displays as `n/a` when unavailable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KpiValue {
    Available(f64),
    Unavailable,
}

impl KpiValue {
    /// `numerator / denominator`, unavailable when the denominator is zero.
    pub fn ratio(numerator: f64, denominator: usize) -> Self {
        if denominator == 0 {
            KpiValue::Unavailable
        } else {
            Self::from_f64(numerator / denominator as f64)
        }
    }

    /// Wrap a computed value; NaN or infinite becomes unavailable.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            KpiValue::Available(value)
        } else {
            KpiValue::Unavailable
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, KpiValue::Available(_))
    }

    pub fn as_option(&self) -> Option<f64> {
        match *self {
            KpiValue::Available(v) => Some(v),
            KpiValue::Unavailable => None,
        }
    }

    /// The value, or an [`UndefinedAggregate`] naming the KPI and condition.
    pub fn value(&self, kpi: &'static str, condition: Condition) -> Result<f64, UndefinedAggregate> {
        self.as_option().ok_or(UndefinedAggregate { kpi, condition })
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            KpiValue::Available(v) => Self::from_f64(f(v)),
            KpiValue::Unavailable => KpiValue::Unavailable,
        }
    }
}

impl fmt::Display for KpiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KpiValue::Available(v) => write!(f, "{v:.2}"),
            KpiValue::Unavailable => f.write_str("n/a"),
        }
    }
}

impl Serialize for KpiValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_option().serialize(serializer)
    }
}

/// KPIs for one condition of a filtered table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionKpis {
    pub condition: Condition,
    /// Distinct participants contributing rows
    pub participants: usize,
    /// Summed fixation duration per participant, seconds
    pub avg_task_duration: KpiValue,
    /// Number of fixation rows
    pub fixation_points: usize,
    /// Mean saccade length over rows that report one
    pub avg_saccade_length: KpiValue,
    /// Mean fixation duration, seconds
    pub avg_fixation_duration: KpiValue,
}

impl ConditionKpis {
    pub const AVG_TASK_DURATION: &'static str = "Average Task Duration";
    pub const FIXATION_POINTS: &'static str = "Number of Fixation-Points";
    pub const AVG_SACCADE_LENGTH: &'static str = "Average Saccade Length";
    pub const AVG_FIXATION_DURATION: &'static str = "Average Fixation Duration";

    /// KPIs of a condition with no rows.
    pub fn empty(condition: Condition) -> Self {
        Self {
            condition,
            participants: 0,
            avg_task_duration: KpiValue::Unavailable,
            fixation_points: 0,
            avg_saccade_length: KpiValue::Unavailable,
            avg_fixation_duration: KpiValue::Unavailable,
        }
    }
}

/// Per-condition KPIs, always containing an entry for every condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiReport {
    conditions: BTreeMap<Condition, ConditionKpis>,
}

impl KpiReport {
    /// Build a report; conditions missing from `kpis` get empty KPIs.
    pub fn new(kpis: impl IntoIterator<Item = ConditionKpis>) -> Self {
        let mut conditions: BTreeMap<Condition, ConditionKpis> =
            kpis.into_iter().map(|k| (k.condition, k)).collect();
        for condition in Condition::ALL {
            conditions
                .entry(condition)
                .or_insert_with(|| ConditionKpis::empty(condition));
        }
        Self { conditions }
    }

    pub fn get(&self, condition: Condition) -> &ConditionKpis {
        // `new` fills every condition
        &self.conditions[&condition]
    }

    /// Every condition's KPIs in display order.
    pub fn iter(&self) -> impl Iterator<Item = &ConditionKpis> {
        self.conditions.values()
    }

    pub fn color(&self) -> &ConditionKpis {
        self.get(Condition::Color)
    }

    pub fn grey(&self) -> &ConditionKpis {
        self.get(Condition::Grey)
    }
}
