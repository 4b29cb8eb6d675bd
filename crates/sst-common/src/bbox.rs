//! Geographic bounding boxes with antimeridian wraparound.

use serde::{Deserialize, Serialize};

/// A latitude/longitude bounding box in degrees.
///
/// `lon_min > lon_max` describes a box that crosses the antimeridian, e.g.
/// `lon_min = 170, lon_max = -170` covers 20 degrees of longitude centred on
/// the dateline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its four bounds.
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// The whole globe.
    pub fn global() -> Self {
        Self::new(-90.0, 90.0, -180.0, 180.0)
    }

    /// Parse a query parameter of the form `"lat_min,lat_max,lon_min,lon_max"`.
    pub fn from_query_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let parse = |p: &str| {
            p.parse::<f64>()
                .map_err(|_| BboxParseError::InvalidNumber(p.to_string()))
        };

        let bbox = Self {
            lat_min: parse(parts[0])?,
            lat_max: parse(parts[1])?,
            lon_min: parse(parts[2])?,
            lon_max: parse(parts[3])?,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Check the latitude invariant and that every bound is a finite number.
    pub fn validate(&self) -> Result<(), BboxParseError> {
        for value in [self.lat_min, self.lat_max, self.lon_min, self.lon_max] {
            if !value.is_finite() {
                return Err(BboxParseError::InvalidNumber(value.to_string()));
            }
        }
        if self.lat_min < -90.0 || self.lat_max > 90.0 {
            return Err(BboxParseError::LatitudeOutOfRange {
                lat_min: self.lat_min,
                lat_max: self.lat_max,
            });
        }
        if self.lat_min > self.lat_max {
            return Err(BboxParseError::InvertedLatitude {
                lat_min: self.lat_min,
                lat_max: self.lat_max,
            });
        }
        Ok(())
    }

    /// True when the box crosses the antimeridian.
    pub fn wraps_antimeridian(&self) -> bool {
        self.longitude_ranges().len() > 1
    }

    /// Longitude sub-ranges covered by this box, in output order.
    ///
    /// A wrapping box yields `[lon_min, 180]` followed by `[-180, lon_max]`.
    /// Spans of 360 degrees or more collapse to the full circle.
    pub fn longitude_ranges(&self) -> Vec<(f64, f64)> {
        if self.lon_max - self.lon_min >= 360.0 {
            return vec![(-180.0, 180.0)];
        }

        let min = wrap_longitude(self.lon_min);
        let max = wrap_longitude(self.lon_max);
        if min <= max {
            vec![(min, max)]
        } else {
            vec![(min, 180.0), (-180.0, max)]
        }
    }

    /// Check if a latitude lies inside the box.
    pub fn contains_lat(&self, lat: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max
    }

    /// Check if a longitude (any convention) lies inside the box.
    pub fn contains_lon(&self, lon: f64) -> bool {
        self.longitude_ranges()
            .iter()
            .any(|&range| match_longitude(lon, range).is_some())
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, lat: f64, lon: f64) -> bool {
        self.contains_lat(lat) && self.contains_lon(lon)
    }

    /// Latitude extent in degrees.
    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Longitude extent in degrees, accounting for wraparound.
    pub fn lon_span(&self) -> f64 {
        self.longitude_ranges()
            .iter()
            .map(|(lo, hi)| hi - lo)
            .sum()
    }

    /// Hashable key quantized to micro-degrees.
    pub fn cache_key(&self) -> BboxKey {
        let q = |v: f64| (v * 1_000_000.0).round() as i64;
        BboxKey([
            q(self.lat_min),
            q(self.lat_max),
            q(self.lon_min),
            q(self.lon_max),
        ])
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::global()
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lat [{}, {}] lon [{}, {}]",
            self.lat_min, self.lat_max, self.lon_min, self.lon_max
        )
    }
}

/// Quantized bounding box used as a cache key component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BboxKey(pub [i64; 4]);

/// Bring a longitude into `[-180, 180]`.
///
/// Values already in range are returned unchanged, so `180.0` stays `180.0`.
pub fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Match a longitude against a closed signed range.
///
/// Returns the representation of `lon` (shifted by a multiple of 360) that
/// falls inside `[lo, hi]`, or `None` when no representation does.
pub fn match_longitude(lon: f64, (lo, hi): (f64, f64)) -> Option<f64> {
    let signed = wrap_longitude(lon);
    [signed, signed + 360.0, signed - 360.0]
        .into_iter()
        .find(|candidate| *candidate >= lo && *candidate <= hi)
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid bbox format: {0}. Expected 'lat_min,lat_max,lon_min,lon_max'")]
    InvalidFormat(String),

    #[error("Invalid number in bbox: {0}")]
    InvalidNumber(String),

    #[error("Latitude bounds out of range: [{lat_min}, {lat_max}]")]
    LatitudeOutOfRange { lat_min: f64, lat_max: f64 },

    #[error("lat_min {lat_min} is greater than lat_max {lat_max}")]
    InvertedLatitude { lat_min: f64, lat_max: f64 },
}
