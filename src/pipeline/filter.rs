//! Row filtering and scanpath ordering
//!
//! Both operations return new views over the same loaded storage; the input
//! table is never modified.

use super::FixationTable;
use crate::types::{Condition, FilterSpec};
use std::collections::HashMap;

/// Keep the rows matching every predicate of `spec`, in their current order.
///
/// No match is a normal outcome and yields an empty table.
pub fn filter_rows(table: &FixationTable, spec: &FilterSpec) -> FixationTable {
    let selection: Vec<usize> = table
        .selection()
        .iter()
        .copied()
        .filter(|&idx| spec.matches(table.storage_row(idx)))
        .collect();

    tracing::debug!(
        input = table.len(),
        matched = selection.len(),
        location = ?spec.location,
        condition = ?spec.condition,
        "Rows filtered"
    );

    table.with_selection(selection)
}

/// Sort rows ascending by `fixation_index` within each `(user, cityMap,
/// condition)` group.
///
/// Groups keep the order of their first row and become contiguous; ties on
/// the index keep their current relative order. Needed before drawing a
/// scanpath, since load order is not guaranteed to be temporal.
pub fn order_by_fixation_index(table: &FixationTable) -> FixationTable {
    let mut group_rank: HashMap<(&str, &str, Condition), usize> = HashMap::new();
    let mut keyed: Vec<(usize, u32, usize)> = Vec::with_capacity(table.len());

    for &idx in table.selection() {
        let row = table.storage_row(idx);
        let next = group_rank.len();
        let rank = *group_rank
            .entry((row.user.as_str(), row.city_map.as_str(), row.condition))
            .or_insert(next);
        keyed.push((rank, row.fixation_index, idx));
    }

    // Stable: equal (rank, index) pairs keep view order
    keyed.sort_by_key(|&(rank, fixation_index, _)| (rank, fixation_index));

    table.with_selection(keyed.into_iter().map(|(_, _, idx)| idx).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{record, table};
    use crate::types::{DurationRange, UserSelection};

    fn sample() -> FixationTable {
        table(vec![
            record("P1", "Antwerpen_S1", Condition::Color, 1, 100.0),
            record("P1", "Antwerpen_S1", Condition::Color, 2, 200.0),
            record("P1", "Antwerpen_S1", Condition::Color, 3, 300.0),
            record("P2", "Antwerpen_S1", Condition::Grey, 1, 400.0),
            record("P2", "Antwerpen_S2", Condition::Grey, 1, 50.0),
            record("P3", "Zürich_S1", Condition::Color, 1, 1000.0),
        ])
    }

    #[test]
    fn test_map_filter_narrower_than_city() {
        let t = sample();
        let by_city = filter_rows(&t, &FilterSpec::all().city("Antwerpen"));
        let by_map = filter_rows(&t, &FilterSpec::all().map("Antwerpen_S1"));
        assert_eq!(by_city.len(), 5);
        assert_eq!(by_map.len(), 4);
        assert!(by_map.iter().all(|r| r.city == "Antwerpen"));
    }

    #[test]
    fn test_conjunction_of_predicates() {
        let t = sample();
        let spec = FilterSpec::all()
            .city("Antwerpen")
            .condition(Condition::Grey)
            .users(UserSelection::from_values(["P2", "P3"]));
        let out = filter_rows(&t, &spec);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.user == "P2" && r.condition == Condition::Grey));
    }

    #[test]
    fn test_unknown_map_is_empty_not_error() {
        let out = filter_rows(&sample(), &FilterSpec::all().map("Nonexistent"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_filter_preserves_order_and_input() {
        let t = sample();
        let out = filter_rows(&t, &FilterSpec::all().condition(Condition::Color));
        let users: Vec<&str> = out.iter().map(|r| r.user.as_str()).collect();
        assert_eq!(users, vec!["P1", "P1", "P1", "P3"]);
        assert_eq!(t.len(), 6);
        assert!(out.shares_storage(&t));
    }

    #[test]
    fn test_duration_target_semantics() {
        let t = filter_rows(&sample(), &FilterSpec::all().map("Antwerpen_S1").user("P1"));

        let per_fixation = filter_rows(&t, &FilterSpec::all().duration(DurationRange::fixation(150.0, 1000.0)));
        let kept: Vec<f64> = per_fixation.iter().map(|r| r.fixation_duration).collect();
        assert_eq!(kept, vec![200.0, 300.0]);

        // Group total is 0.6 s, shared by all three rows
        let per_task = filter_rows(&t, &FilterSpec::all().duration(DurationRange::task(0.5, 1.0)));
        assert_eq!(per_task.len(), 3);
    }

    #[test]
    fn test_ordering_within_groups() {
        let t = table(vec![
            record("P1", "A_S1", Condition::Color, 3, 100.0),
            record("P2", "A_S1", Condition::Color, 2, 100.0),
            record("P1", "A_S1", Condition::Color, 1, 100.0),
            record("P2", "A_S1", Condition::Color, 1, 100.0),
            record("P1", "A_S1", Condition::Color, 2, 100.0),
        ]);
        let ordered = order_by_fixation_index(&t);
        let seq: Vec<(&str, u32)> = ordered
            .iter()
            .map(|r| (r.user.as_str(), r.fixation_index))
            .collect();
        assert_eq!(seq, vec![("P1", 1), ("P1", 2), ("P1", 3), ("P2", 1), ("P2", 2)]);
        // Input view untouched
        assert_eq!(t.get(0).map(|r| r.fixation_index), Some(3));
    }

    #[test]
    fn test_ordering_empty_table() {
        assert!(order_by_fixation_index(&FixationTable::empty()).is_empty());
    }
}
