//! Illustrative fields and series for when the provider is unavailable.

use std::f64::consts::PI;
use std::sync::Arc;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sst_common::{BoundingBox, GriddedAnomalyField};

use crate::error::Result;
use crate::series::{RegionSeries, SeriesPoint, YearRange};

/// A resolved field tagged with where it came from.
#[derive(Debug, Clone)]
pub enum FieldOutcome {
    /// Observed data from the provider.
    Real(Arc<GriddedAnomalyField>),
    /// Synthetic data standing in for an unavailable provider.
    Fallback {
        field: Arc<GriddedAnomalyField>,
        reason: String,
    },
}

impl FieldOutcome {
    pub fn field(&self) -> &Arc<GriddedAnomalyField> {
        match self {
            FieldOutcome::Real(field) => field,
            FieldOutcome::Fallback { field, .. } => field,
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, FieldOutcome::Real(_))
    }

    /// Why the fallback was used, if it was.
    pub fn reason(&self) -> Option<&str> {
        match self {
            FieldOutcome::Real(_) => None,
            FieldOutcome::Fallback { reason, .. } => Some(reason),
        }
    }

    /// `"observed"` or `"illustrative"`.
    pub fn label(&self) -> &'static str {
        if self.is_real() {
            "observed"
        } else {
            "illustrative"
        }
    }
}

/// A regional series tagged with where it came from.
#[derive(Debug, Clone)]
pub enum SeriesOutcome {
    Real(RegionSeries),
    Fallback { series: RegionSeries, reason: String },
}

impl SeriesOutcome {
    pub fn series(&self) -> &RegionSeries {
        match self {
            SeriesOutcome::Real(series) => series,
            SeriesOutcome::Fallback { series, .. } => series,
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, SeriesOutcome::Real(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            SeriesOutcome::Real(_) => None,
            SeriesOutcome::Fallback { reason, .. } => Some(reason),
        }
    }

    /// `"observed"` or `"illustrative"`.
    pub fn label(&self) -> &'static str {
        if self.is_real() {
            "observed"
        } else {
            "illustrative"
        }
    }
}

/// First year of the satellite SST record the trend is anchored to.
const TREND_BASE_YEAR: i32 = 1981;
/// Warming trend in °C per year.
const TREND_PER_YEAR: f64 = 0.02;
const SEASONAL_AMPLITUDE: f64 = 0.4;
const NOISE_AMPLITUDE: f32 = 0.15;

/// Deterministic generator for illustrative anomaly fields.
///
/// The same date and bbox always produce the same field.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticFieldGenerator {
    resolution_deg: f64,
}

impl Default for SyntheticFieldGenerator {
    fn default() -> Self {
        Self {
            resolution_deg: 1.0,
        }
    }
}

impl SyntheticFieldGenerator {
    /// Create a generator on a regular grid of `resolution_deg` cells.
    ///
    /// Non-finite or non-positive resolutions fall back to 1 degree.
    pub fn new(resolution_deg: f64) -> Self {
        let resolution_deg = if resolution_deg.is_finite() && resolution_deg > 0.0 {
            resolution_deg.clamp(0.05, 10.0)
        } else {
            1.0
        };
        Self { resolution_deg }
    }

    pub fn resolution_deg(&self) -> f64 {
        self.resolution_deg
    }

    /// Cell centres inside `[lo, hi]` on a grid starting at `origin`.
    fn centres(&self, origin: f64, count: usize, lo: f64, hi: f64) -> Vec<f64> {
        (0..count)
            .map(|i| origin + self.resolution_deg * (i as f64 + 0.5))
            .filter(|c| *c >= lo && *c <= hi)
            .collect()
    }

    fn latitudes(&self, bbox: &BoundingBox) -> Vec<f64> {
        let count = (180.0 / self.resolution_deg).ceil() as usize;
        let lats = self.centres(-90.0, count, bbox.lat_min, bbox.lat_max);
        if lats.is_empty() {
            vec![(bbox.lat_min + bbox.lat_max) / 2.0]
        } else {
            lats
        }
    }

    fn longitudes(&self, bbox: &BoundingBox) -> Vec<f64> {
        let count = (360.0 / self.resolution_deg).ceil() as usize;
        let ranges = bbox.longitude_ranges();
        let lons: Vec<f64> = ranges
            .iter()
            .flat_map(|&(lo, hi)| self.centres(-180.0, count, lo, hi))
            .collect();
        if lons.is_empty() {
            let (lo, hi) = ranges[0];
            vec![(lo + hi) / 2.0]
        } else {
            lons
        }
    }

    /// Generate a field for `target` covering `bbox` (the globe when `None`).
    pub fn generate(
        &self,
        target: DateTime<Utc>,
        bbox: Option<&BoundingBox>,
    ) -> Result<GriddedAnomalyField> {
        let bbox = bbox.copied().unwrap_or_else(BoundingBox::global);
        let latitudes = self.latitudes(&bbox);
        let longitudes = self.longitudes(&bbox);

        let date = target.date_naive();
        let mut rng = StdRng::seed_from_u64(date.num_days_from_ce() as u64);

        let years = (date.year() - TREND_BASE_YEAR) as f64 + date.ordinal0() as f64 / 365.25;
        let trend = TREND_PER_YEAR * years.max(0.0);
        // Peaks in late summer for the northern hemisphere
        let phase = 2.0 * PI * (date.ordinal0() as f64 - 45.0) / 365.25;

        let mut values = Vec::with_capacity(latitudes.len() * longitudes.len());
        for &lat in &latitudes {
            let seasonal = SEASONAL_AMPLITUDE * phase.sin() * (lat / 90.0);
            for &lon in &longitudes {
                let spatial = 0.3 * (2.0 * lon.to_radians()).cos() * lat.to_radians().cos();
                let noise = rng.gen_range(-NOISE_AMPLITUDE..=NOISE_AMPLITUDE);
                values.push((trend + seasonal + spatial) as f32 + noise);
            }
        }

        Ok(GriddedAnomalyField::new(
            target, latitudes, longitudes, values, None,
        )?)
    }

    /// Monthly illustrative series over `bbox`, one point on the 15th of each
    /// month in `years`, stopping at the current month.
    pub fn series(&self, bbox: Option<&BoundingBox>, years: YearRange) -> Result<Vec<SeriesPoint>> {
        let now = Utc::now();
        let mut points = Vec::new();

        for year in years.start()..=years.end() {
            for month in 1..=12 {
                let Some(time) = Utc.with_ymd_and_hms(year, month, 15, 0, 0, 0).single() else {
                    continue;
                };
                if time > now {
                    return Ok(points);
                }
                if let Some(stats) = self.generate(time, bbox)?.stats() {
                    points.push(SeriesPoint {
                        time,
                        mean_anomaly: stats.mean,
                        cells: stats.count,
                    });
                }
            }
        }
        Ok(points)
    }
}
