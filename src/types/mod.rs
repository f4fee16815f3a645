//! Shared data structures for the fixation query pipeline
//!
//! - `fixation`: FixationRecord (one CSV row), FixationRow (record + joined
//!   group summaries), Condition, GroupKey
//! - `filter`: FilterSpec and its per-dimension predicates
//! - `kpi`: KpiReport, ConditionKpis, guarded KpiValue

mod fixation;
mod filter;
mod kpi;

pub use fixation::*;
pub use filter::*;
pub use kpi::*;
