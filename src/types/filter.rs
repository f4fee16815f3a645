//! Query filter specification
//!
//! A [`FilterSpec`] is built by the caller for one query and dropped after it.
//! Every dimension is optional; an absent dimension does not restrict rows.

use super::{Condition, FixationRow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sentinel a UI dropdown uses for "no user restriction".
pub const ALL_USERS: &str = "All";

/// Location restriction, at city or map granularity.
///
/// A map-level filter is strictly narrower than a city-level one: every map
/// belongs to exactly one city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum LocationFilter {
    /// Exact match on `city`
    City(String),
    /// Exact match on `cityMap`
    Map(String),
}

impl LocationFilter {
    fn matches(&self, row: &FixationRow) -> bool {
        match self {
            LocationFilter::City(city) => row.city == *city,
            LocationFilter::Map(map) => row.city_map == *map,
        }
    }
}

/// Which participants to keep.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSelection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl UserSelection {
    /// Build from raw UI values. An empty list or the `All` sentinel selects everyone.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut users = BTreeSet::new();
        for value in values {
            let value = value.as_ref().trim();
            if value.eq_ignore_ascii_case(ALL_USERS) {
                return UserSelection::All;
            }
            if !value.is_empty() {
                users.insert(value.to_string());
            }
        }
        if users.is_empty() {
            UserSelection::All
        } else {
            UserSelection::Only(users)
        }
    }

    fn matches(&self, user: &str) -> bool {
        match self {
            UserSelection::All => true,
            UserSelection::Only(users) => users.contains(user),
        }
    }
}

/// Field a duration range is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationTarget {
    /// Group-level `task_duration_aggregated`, seconds
    #[default]
    Task,
    /// Row-level `fixation_duration`, milliseconds
    Fixation,
}

/// Inclusive duration bounds in the unit of their [`DurationTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationRange {
    pub target: DurationTarget,
    pub min: f64,
    pub max: f64,
}

impl DurationRange {
    pub fn task(min: f64, max: f64) -> Self {
        Self { target: DurationTarget::Task, min, max }
    }

    pub fn fixation(min: f64, max: f64) -> Self {
        Self { target: DurationTarget::Fixation, min, max }
    }

    /// Open bounds on either side become infinite.
    pub fn from_bounds(target: DurationTarget, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            target,
            min: min.unwrap_or(f64::NEG_INFINITY),
            max: max.unwrap_or(f64::INFINITY),
        }
    }

    pub fn contains(&self, row: &FixationRow) -> bool {
        let value = match self.target {
            DurationTarget::Task => row.task_duration_aggregated,
            DurationTarget::Fixation => row.fixation_duration,
        };
        value >= self.min && value <= self.max
    }
}

/// Conjunction of optional predicates applied by `filter_rows`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    pub location: Option<LocationFilter>,
    pub condition: Option<Condition>,
    #[serde(default)]
    pub users: UserSelection,
    pub duration: Option<DurationRange>,
}

impl FilterSpec {
    /// Spec that keeps every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.location = Some(LocationFilter::City(city.into()));
        self
    }

    pub fn map(mut self, city_map: impl Into<String>) -> Self {
        self.location = Some(LocationFilter::Map(city_map.into()));
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn users(mut self, users: UserSelection) -> Self {
        self.users = users;
        self
    }

    pub fn user(self, user: impl Into<String>) -> Self {
        let user = user.into();
        self.users(UserSelection::from_values([user]))
    }

    pub fn duration(mut self, range: DurationRange) -> Self {
        self.duration = Some(range);
        self
    }

    /// `true` if the row satisfies every present predicate.
    pub fn matches(&self, row: &FixationRow) -> bool {
        self.location.as_ref().map_or(true, |l| l.matches(row))
            && self.condition.map_or(true, |c| row.condition == c)
            && self.users.matches(&row.user)
            && self.duration.as_ref().map_or(true, |d| d.contains(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_selection_sentinel() {
        assert_eq!(UserSelection::from_values(["All"]), UserSelection::All);
        assert_eq!(UserSelection::from_values(["P1", "all"]), UserSelection::All);
        assert_eq!(UserSelection::from_values(Vec::<String>::new()), UserSelection::All);
        assert_eq!(UserSelection::from_values([" ", ""]), UserSelection::All);

        match UserSelection::from_values(["P2", "P1", "P2"]) {
            UserSelection::Only(users) => {
                assert_eq!(users.into_iter().collect::<Vec<_>>(), vec!["P1", "P2"]);
            }
            UserSelection::All => panic!("expected explicit users"),
        }
    }

    #[test]
    fn test_open_bounds() {
        let range = DurationRange::from_bounds(DurationTarget::Fixation, Some(100.0), None);
        assert_eq!(range.min, 100.0);
        assert!(range.max.is_infinite());
    }
}
