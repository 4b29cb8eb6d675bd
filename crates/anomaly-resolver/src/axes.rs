//! Normalization of provider-specific dimension names.
//!
//! Providers disagree on what to call their axes (`latitude` vs `lat`,
//! `time` vs `date`, ...). Every name is looked up in a fixed table; a name
//! that is not in the table is an error rather than a guess.

use std::fmt;

/// The role a dimension plays in an anomaly array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisRole {
    Time,
    Level,
    Latitude,
    Longitude,
}

impl AxisRole {
    /// Canonical dimension name.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            AxisRole::Time => "time",
            AxisRole::Level => "level",
            AxisRole::Latitude => "lat",
            AxisRole::Longitude => "lon",
        }
    }
}

impl fmt::Display for AxisRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Known source-side names and the role each maps to.
const AXIS_NAMES: &[(&str, AxisRole)] = &[
    ("time", AxisRole::Time),
    ("date", AxisRole::Time),
    ("t", AxisRole::Time),
    ("latitude", AxisRole::Latitude),
    ("lat", AxisRole::Latitude),
    ("longitude", AxisRole::Longitude),
    ("lon", AxisRole::Longitude),
    ("zlev", AxisRole::Level),
    ("depth", AxisRole::Level),
];

/// Classify a dimension name (case-insensitive).
pub fn classify(name: &str) -> Option<AxisRole> {
    let name = name.trim();
    AXIS_NAMES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, role)| *role)
}
