//! Dataset overview: what is in the loaded table
//!
//! Feeds the selection widgets (city/map/user option lists, duration slider
//! bounds) and the exploratory counts per city and per participant.

use crate::pipeline::FixationTable;
use crate::types::Condition;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Inclusive `[min, max]` of a duration, seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DurationBounds {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetCatalog {
    pub rows: usize,
    pub cities: Vec<String>,
    pub city_maps: Vec<String>,
    pub users: Vec<String>,
    /// Participants that viewed each condition, sorted
    pub users_by_condition: BTreeMap<Condition, Vec<String>>,
    pub fixations_per_city: BTreeMap<String, usize>,
    pub fixations_per_user: BTreeMap<String, usize>,
    /// Distinct participants per city
    pub users_per_city: BTreeMap<String, usize>,
    /// Task-duration range per condition; absent when the condition has no rows
    pub task_duration_bounds: BTreeMap<Condition, DurationBounds>,
}

pub fn catalog(table: &FixationTable) -> DatasetCatalog {
    let mut cities = BTreeSet::new();
    let mut city_maps = BTreeSet::new();
    let mut users_by_condition: BTreeMap<Condition, BTreeSet<&str>> = BTreeMap::new();
    let mut fixations_per_city: BTreeMap<String, usize> = BTreeMap::new();
    let mut fixations_per_user: BTreeMap<String, usize> = BTreeMap::new();
    let mut city_users: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut task_duration_bounds: BTreeMap<Condition, DurationBounds> = BTreeMap::new();

    for row in table.iter() {
        cities.insert(row.city.as_str());
        city_maps.insert(row.city_map.as_str());
        users_by_condition.entry(row.condition).or_default().insert(row.user.as_str());
        *fixations_per_city.entry(row.city.clone()).or_default() += 1;
        *fixations_per_user.entry(row.user.clone()).or_default() += 1;
        city_users.entry(row.city.as_str()).or_default().insert(row.user.as_str());

        let d = row.task_duration_aggregated;
        task_duration_bounds
            .entry(row.condition)
            .and_modify(|b| {
                b.min = b.min.min(d);
                b.max = b.max.max(d);
            })
            .or_insert(DurationBounds { min: d, max: d });
    }

    let owned = |set: BTreeSet<&str>| set.into_iter().map(str::to_string).collect::<Vec<_>>();

    DatasetCatalog {
        rows: table.len(),
        cities: owned(cities),
        city_maps: owned(city_maps),
        users: owned(table.users()),
        users_by_condition: users_by_condition
            .into_iter()
            .map(|(c, users)| (c, owned(users)))
            .collect(),
        fixations_per_city,
        fixations_per_user,
        users_per_city: city_users
            .into_iter()
            .map(|(city, users)| (city.to_string(), users.len()))
            .collect(),
        task_duration_bounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{record, table};

    #[test]
    fn test_catalog_counts() {
        let t = table(vec![
            record("P2", "Antwerpen_S1", Condition::Color, 1, 1000.0),
            record("P2", "Antwerpen_S1", Condition::Color, 2, 1000.0),
            record("P1", "Antwerpen_S2", Condition::Grey, 1, 500.0),
            record("P1", "Zürich_S1", Condition::Color, 1, 4000.0),
        ]);
        let c = catalog(&t);
        assert_eq!(c.rows, 4);
        assert_eq!(c.cities, vec!["Antwerpen", "Zürich"]);
        assert_eq!(c.city_maps, vec!["Antwerpen_S1", "Antwerpen_S2", "Zürich_S1"]);
        assert_eq!(c.users, vec!["P1", "P2"]);
        assert_eq!(c.users_by_condition[&Condition::Color], vec!["P1", "P2"]);
        assert_eq!(c.users_by_condition[&Condition::Grey], vec!["P1"]);
        assert_eq!(c.fixations_per_city["Antwerpen"], 3);
        assert_eq!(c.fixations_per_user["P2"], 2);
        assert_eq!(c.users_per_city["Antwerpen"], 2);
        assert_eq!(c.users_per_city["Zürich"], 1);
        assert_eq!(c.task_duration_bounds[&Condition::Color], DurationBounds { min: 2.0, max: 4.0 });
        assert_eq!(c.task_duration_bounds[&Condition::Grey], DurationBounds { min: 0.5, max: 0.5 });
    }

    #[test]
    fn test_catalog_empty() {
        let c = catalog(&FixationTable::empty());
        assert_eq!(c.rows, 0);
        assert!(c.task_duration_bounds.is_empty());
        assert!(c.users_by_condition.is_empty());
    }
}
