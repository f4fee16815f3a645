//! Deterministic participant color assignment for plot legends

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Plotly's qualitative palette, the dashboards' default legend colors.
pub const PLOTLY_QUALITATIVE: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A",
    "#19D3F3", "#FF6692", "#B6E880", "#FF97FF", "#FECB52",
];

/// Participant id -> color token.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ColorMap {
    assignments: BTreeMap<String, String>,
}

impl ColorMap {
    pub fn get(&self, user: &str) -> Option<&str> {
        self.assignments.get(user).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Assignments in user order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.assignments.iter().map(|(u, c)| (u.as_str(), c.as_str()))
    }
}

/// Assign palette entries round-robin over the sorted distinct users.
///
/// Blank ids are skipped. The result depends only on the set of users, never
/// on their input order. An empty palette falls back to [`PLOTLY_QUALITATIVE`].
pub fn build_color_map<I, S, P>(users: I, palette: &[P]) -> ColorMap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    P: AsRef<str>,
{
    let palette: Vec<&str> = if palette.is_empty() {
        PLOTLY_QUALITATIVE.to_vec()
    } else {
        palette.iter().map(|c| c.as_ref()).collect()
    };

    let unique: BTreeSet<String> = users
        .into_iter()
        .map(|u| u.as_ref().trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();

    let assignments = unique
        .into_iter()
        .enumerate()
        .map(|(i, user)| (user, palette[i % palette.len()].to_string()))
        .collect();

    ColorMap { assignments }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_independent() {
        let a = build_color_map(["P3", "P1", "P2"], &PLOTLY_QUALITATIVE);
        let b = build_color_map(vec!["P2".to_string(), "P3".into(), "P1".into(), "P1".into()], &PLOTLY_QUALITATIVE);
        assert_eq!(a, b);
        assert_eq!(a.get("P1"), Some("#636EFA"));
        assert_eq!(a.get("P2"), Some("#EF553B"));
        assert_eq!(a.get("P3"), Some("#00CC96"));
    }

    #[test]
    fn test_round_robin_wraps() {
        let palette = ["red", "blue"];
        let map = build_color_map(["a", "b", "c", "", "  "], &palette);
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("a"), Some("red"));
        assert_eq!(map.get("b"), Some("blue"));
        assert_eq!(map.get("c"), Some("red"));
    }

    #[test]
    fn test_empty_palette_falls_back() {
        let map = build_color_map(["x"], &[] as &[&str]);
        assert_eq!(map.get("x"), Some(PLOTLY_QUALITATIVE[0]));
    }
}
