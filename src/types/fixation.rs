//! Fixation records and the per-group summary fields joined onto them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds per second; durations are recorded in ms, summaries reported in s.
pub const MS_PER_SECOND: f64 = 1000.0;

// ============================================================================
// Condition
// ============================================================================

/// Rendering condition of the stimulus map a participant looked at.
///
/// Source exports label the greyscale variant either `grey` or `gray`
/// (sometimes both within one file). Both are folded into [`Condition::Grey`]
/// at load time; the label used on output is chosen by [`GreyLabel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Color,
    Grey,
}

impl Condition {
    /// Both conditions, in display order.
    pub const ALL: [Condition; 2] = [Condition::Color, Condition::Grey];

    /// Parse a `description` cell. Case-insensitive, surrounding whitespace ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "color" | "colour" => Some(Condition::Color),
            "grey" | "gray" => Some(Condition::Grey),
            _ => None,
        }
    }

    /// `true` when the raw label is the American `gray` spelling.
    pub fn is_gray_alias(raw: &str) -> bool {
        raw.trim().eq_ignore_ascii_case("gray")
    }

    /// Output label for this condition under the given grey spelling.
    pub fn label(self, grey: GreyLabel) -> &'static str {
        match self {
            Condition::Color => "color",
            Condition::Grey => grey.as_str(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label(GreyLabel::Grey))
    }
}

/// Canonical output spelling for the greyscale condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GreyLabel {
    #[default]
    Grey,
    Gray,
}

impl GreyLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            GreyLabel::Grey => "grey",
            GreyLabel::Gray => "gray",
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// One recorded eye fixation, as exported by the eye-tracker tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixationRecord {
    /// Raw timestamp cell, kept verbatim (export format varies)
    pub timestamp: Option<String>,
    /// Stimulus image name
    pub stimulus_name: Option<String>,
    /// Sequence number within a viewing session
    pub fixation_index: u32,
    /// Fixation duration in milliseconds (never negative)
    pub fixation_duration: f64,
    /// X pixel coordinate on the stimulus image
    pub mapped_x: f64,
    /// Y pixel coordinate on the stimulus image
    pub mapped_y: f64,
    /// X coordinate rescaled for a differently sized image
    pub normalized_x: Option<f64>,
    /// Distance from the previous fixation
    pub saccade_length: Option<f64>,
    /// Participant identifier
    pub user: String,
    /// Map variant, e.g. `Antwerpen_S1`
    pub city_map: String,
    /// Base city name, e.g. `Antwerpen`
    pub city: String,
    /// Color or greyscale stimulus
    pub condition: Condition,
}

impl FixationRecord {
    /// Grouping key shared by all fixations of one participant on one stimulus.
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            user: self.user.clone(),
            city_map: self.city_map.clone(),
            condition: self.condition,
        }
    }

    /// X coordinate for plotting: normalized X when requested and present.
    pub fn plot_x(&self, prefer_normalized: bool) -> f64 {
        if prefer_normalized {
            self.normalized_x.unwrap_or(self.mapped_x)
        } else {
            self.mapped_x
        }
    }
}

/// `(user, cityMap, condition)`: one participant viewing one stimulus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    pub user: String,
    pub city_map: String,
    pub condition: Condition,
}

/// A fixation record enriched with its group's summary fields.
///
/// `task_duration_aggregated` is the group's summed fixation duration and
/// `avg_fixation_duration` its mean, both in seconds. The record's own
/// `fixation_duration` stays in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixationRow {
    #[serde(flatten)]
    pub record: FixationRecord,
    pub task_duration_aggregated: f64,
    pub avg_fixation_duration: f64,
}

impl std::ops::Deref for FixationRow {
    type Target = FixationRecord;

    fn deref(&self) -> &FixationRecord {
        &self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_aliases() {
        assert_eq!(Condition::parse("color"), Some(Condition::Color));
        assert_eq!(Condition::parse(" Colour "), Some(Condition::Color));
        assert_eq!(Condition::parse("grey"), Some(Condition::Grey));
        assert_eq!(Condition::parse("GRAY"), Some(Condition::Grey));
        assert_eq!(Condition::parse("sepia"), None);
        assert_eq!(Condition::parse(""), None);
    }

    #[test]
    fn test_grey_label_choice() {
        assert_eq!(Condition::Grey.label(GreyLabel::Grey), "grey");
        assert_eq!(Condition::Grey.label(GreyLabel::Gray), "gray");
        assert_eq!(Condition::Color.label(GreyLabel::Gray), "color");
        assert!(Condition::is_gray_alias("Gray"));
        assert!(!Condition::is_gray_alias("grey"));
    }

    #[test]
    fn test_plot_x_falls_back_to_mapped() {
        let record = FixationRecord {
            timestamp: None,
            stimulus_name: None,
            fixation_index: 1,
            fixation_duration: 120.0,
            mapped_x: 10.0,
            mapped_y: 20.0,
            normalized_x: None,
            saccade_length: None,
            user: "P1".into(),
            city_map: "Antwerpen_S1".into(),
            city: "Antwerpen".into(),
            condition: Condition::Color,
        };
        assert_eq!(record.plot_x(true), 10.0);

        let normalized = FixationRecord { normalized_x: Some(42.0), ..record };
        assert_eq!(normalized.plot_x(true), 42.0);
        assert_eq!(normalized.plot_x(false), 10.0);
    }
}
