//! Named regions offered as presets to report viewers.

use crate::BoundingBox;
use serde::Serialize;

/// A named bounding box.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RegionPreset {
    /// Stable key used in query strings.
    pub key: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    pub bbox: BoundingBox,
}

const PRESETS: &[RegionPreset] = &[
    RegionPreset {
        key: "global",
        name: "Global ocean",
        bbox: BoundingBox {
            lat_min: -90.0,
            lat_max: 90.0,
            lon_min: -180.0,
            lon_max: 180.0,
        },
    },
    RegionPreset {
        key: "east_asia",
        name: "East Asia",
        bbox: BoundingBox {
            lat_min: 5.0,
            lat_max: 55.0,
            lon_min: 105.0,
            lon_max: 150.0,
        },
    },
    RegionPreset {
        key: "korean_seas",
        name: "Seas around the Korean Peninsula",
        bbox: BoundingBox {
            lat_min: 30.0,
            lat_max: 45.0,
            lon_min: 120.0,
            lon_max: 135.0,
        },
    },
    // Crosses the antimeridian
    RegionPreset {
        key: "north_pacific",
        name: "North Pacific",
        bbox: BoundingBox {
            lat_min: 20.0,
            lat_max: 60.0,
            lon_min: 150.0,
            lon_max: -130.0,
        },
    },
    // Crosses the antimeridian
    RegionPreset {
        key: "tropical_pacific",
        name: "Tropical Pacific",
        bbox: BoundingBox {
            lat_min: -20.0,
            lat_max: 20.0,
            lon_min: 150.0,
            lon_max: -80.0,
        },
    },
    RegionPreset {
        key: "caribbean",
        name: "Caribbean",
        bbox: BoundingBox {
            lat_min: 8.0,
            lat_max: 28.0,
            lon_min: -90.0,
            lon_max: -58.0,
        },
    },
    RegionPreset {
        key: "indian_ocean",
        name: "Indian Ocean",
        bbox: BoundingBox {
            lat_min: -40.0,
            lat_max: 25.0,
            lon_min: 40.0,
            lon_max: 110.0,
        },
    },
    RegionPreset {
        key: "north_atlantic",
        name: "North Atlantic",
        bbox: BoundingBox {
            lat_min: 0.0,
            lat_max: 65.0,
            lon_min: -80.0,
            lon_max: 0.0,
        },
    },
];

/// All region presets in display order.
pub fn presets() -> &'static [RegionPreset] {
    PRESETS
}

/// Look up a preset by key (case-insensitive).
pub fn find_preset(key: &str) -> Option<&'static RegionPreset> {
    let key = key.trim();
    PRESETS.iter().find(|p| p.key.eq_ignore_ascii_case(key))
}
