//! Common types shared by the SST anomaly resolver and its services.

pub mod bbox;
pub mod field;
pub mod regions;
pub mod time;

pub use bbox::{match_longitude, wrap_longitude, BboxKey, BboxParseError, BoundingBox};
pub use field::{FieldShapeError, FieldStats, GriddedAnomalyField};
pub use regions::{find_preset, presets, RegionPreset};
pub use time::{
    parse_datetime, Granularity, StepWindow, TieBreak, TimeIndex, TimeIndexError, TimeParseError,
    TimeRange,
};
