//! Immutable fixation table with cheap filtered/reordered views
//!
//! The row storage is loaded once and shared behind an `Arc`; every query
//! produces a new view (an index selection into that storage) and never
//! touches the rows themselves, so one loaded table can serve any number of
//! concurrent readers without locking.

use crate::types::{Condition, FixationRow, GroupKey};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A read-only selection of enriched fixation rows.
#[derive(Debug, Clone)]
pub struct FixationTable {
    rows: Arc<[FixationRow]>,
    selection: Arc<[usize]>,
}

impl FixationTable {
    /// Wrap fully enriched rows. All rows are selected, in the given order.
    pub fn from_rows(rows: Vec<FixationRow>) -> Self {
        let selection: Arc<[usize]> = (0..rows.len()).collect();
        Self {
            rows: rows.into(),
            selection,
        }
    }

    /// A table with no rows.
    pub fn empty() -> Self {
        Self::from_rows(Vec::new())
    }

    /// View over the same storage with a different selection.
    pub(crate) fn with_selection(&self, selection: Vec<usize>) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            selection: selection.into(),
        }
    }

    /// Storage indices of the selected rows, in view order.
    pub(crate) fn selection(&self) -> &[usize] {
        &self.selection
    }

    /// Row at a storage index.
    pub(crate) fn storage_row(&self, idx: usize) -> &FixationRow {
        &self.rows[idx]
    }

    pub fn len(&self) -> usize {
        self.selection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selection.is_empty()
    }

    /// Row at a view position.
    pub fn get(&self, pos: usize) -> Option<&FixationRow> {
        self.selection.get(pos).map(|&idx| &self.rows[idx])
    }

    /// Selected rows in view order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &FixationRow> + '_ {
        self.selection.iter().map(move |&idx| &self.rows[idx])
    }

    /// Owned copies of the selected rows.
    pub fn to_rows(&self) -> Vec<FixationRow> {
        self.iter().cloned().collect()
    }

    /// `true` if both views read the same loaded storage.
    pub fn shares_storage(&self, other: &FixationTable) -> bool {
        Arc::ptr_eq(&self.rows, &other.rows)
    }

    /// Distinct, non-empty participant ids, sorted.
    pub fn users(&self) -> BTreeSet<&str> {
        self.iter()
            .map(|r| r.user.as_str())
            .filter(|u| !u.is_empty())
            .collect()
    }

    /// Distinct participants of one condition, sorted.
    pub fn users_for(&self, condition: Condition) -> BTreeSet<&str> {
        self.iter()
            .filter(|r| r.condition == condition)
            .map(|r| r.user.as_str())
            .collect()
    }

    /// Selected rows grouped by `(user, cityMap, condition)`.
    ///
    /// Groups appear in order of their first row; rows keep view order.
    pub fn groups(&self) -> Vec<(GroupKey, Vec<&FixationRow>)> {
        let mut positions: HashMap<(&str, &str, Condition), usize> = HashMap::new();
        let mut groups: Vec<(GroupKey, Vec<&FixationRow>)> = Vec::new();

        for row in self.iter() {
            let slot = *positions
                .entry((row.user.as_str(), row.city_map.as_str(), row.condition))
                .or_insert_with(|| {
                    groups.push((row.group_key(), Vec::new()));
                    groups.len() - 1
                });
            groups[slot].1.push(row);
        }

        groups
    }
}

impl PartialEq for FixationTable {
    /// Views are equal when they yield equal rows in the same order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<'a> IntoIterator for &'a FixationTable {
    type Item = &'a FixationRow;
    type IntoIter = Box<dyn ExactSizeIterator<Item = &'a FixationRow> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::row;

    #[test]
    fn test_groups_in_first_appearance_order() {
        let table = FixationTable::from_rows(vec![
            row("P2", "A_S1", Condition::Color, 1, 100.0),
            row("P1", "A_S1", Condition::Color, 1, 100.0),
            row("P2", "A_S1", Condition::Color, 2, 100.0),
            row("P2", "A_S1", Condition::Grey, 1, 100.0),
        ]);
        let groups = table.groups();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].0.user, "P2");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0.user, "P1");
        assert_eq!(groups[2].0.condition, Condition::Grey);
    }

    #[test]
    fn test_views_share_storage() {
        let table = FixationTable::from_rows(vec![
            row("P1", "A_S1", Condition::Color, 1, 100.0),
            row("P2", "A_S1", Condition::Grey, 1, 100.0),
        ]);
        let view = table.with_selection(vec![1]);
        assert!(view.shares_storage(&table));
        assert_eq!(view.len(), 1);
        assert_eq!(view.get(0).map(|r| r.user.as_str()), Some("P2"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.users().into_iter().collect::<Vec<_>>(), vec!["P1", "P2"]);
        assert_eq!(table.users_for(Condition::Grey).len(), 1);
    }
}
