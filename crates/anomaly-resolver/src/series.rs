//! Regional anomaly series: the area-mean anomaly inside a box at every time
//! step of a range of years, with yearly aggregates and rebasing against the
//! first years of the series.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sst_common::{BoundingBox, TieBreak, TimeRange};
use tracing::debug;

use crate::array::Dataset;
use crate::error::Result;
use crate::resolver::{resolve_dataset, time_steps};

/// Inclusive range of calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    /// `None` when `start > end` or a year lies outside 1..=9999.
    pub fn new(start: i32, end: i32) -> Option<Self> {
        let valid = 1..=9999;
        (start <= end && valid.contains(&start) && valid.contains(&end))
            .then_some(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }

    /// From 1 January of the first year to the last second of the last year.
    pub fn period(&self) -> TimeRange {
        let start = Utc
            .with_ymd_and_hms(self.start, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = Utc
            .with_ymd_and_hms(self.end, 12, 31, 23, 59, 59)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        TimeRange::new(start, end)
    }
}

/// Area-mean anomaly at one time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: DateTime<Utc>,
    pub mean_anomaly: f64,
    /// Non-missing cells averaged.
    pub cells: usize,
}

/// Mean of the step means within one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyMean {
    pub year: i32,
    pub mean_anomaly: f64,
    pub steps: usize,
}

/// A regional series for a box and a range of years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSeries {
    pub bbox: Option<BoundingBox>,
    pub years: YearRange,
    /// Set once the means were rebased, see [`RegionSeries::rebased`].
    pub baseline_years: Option<u32>,
    pub points: Vec<SeriesPoint>,
}

impl RegionSeries {
    pub fn new(bbox: Option<BoundingBox>, years: YearRange, points: Vec<SeriesPoint>) -> Self {
        Self {
            bbox,
            years,
            baseline_years: None,
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Yearly means, ascending by year.
    pub fn yearly(&self) -> Vec<YearlyMean> {
        let mut yearly: Vec<YearlyMean> = Vec::new();
        for point in &self.points {
            let year = point.time.year();
            match yearly.last_mut() {
                Some(last) if last.year == year => {
                    last.mean_anomaly += point.mean_anomaly;
                    last.steps += 1;
                }
                _ => yearly.push(YearlyMean {
                    year,
                    mean_anomaly: point.mean_anomaly,
                    steps: 1,
                }),
            }
        }
        for year in &mut yearly {
            year.mean_anomaly /= year.steps as f64;
        }
        yearly
    }

    /// Re-express every mean relative to the average over the first `years`
    /// calendar years of the series.
    ///
    /// Left unchanged when `years` is zero or the series is empty.
    pub fn rebased(mut self, years: u32) -> Self {
        let Some(first) = self.points.first().map(|p| p.time.year()) else {
            return self;
        };
        if years == 0 {
            return self;
        }

        let cutoff = first.saturating_add(years as i32);
        let baseline: Vec<f64> = self
            .points
            .iter()
            .filter(|p| p.time.year() < cutoff)
            .map(|p| p.mean_anomaly)
            .collect();
        let mean = baseline.iter().sum::<f64>() / baseline.len() as f64;

        for point in &mut self.points {
            point.mean_anomaly -= mean;
        }
        self.baseline_years = Some(years);
        self
    }
}

/// Area-mean anomaly of `variable` inside `bbox` at every time step whose
/// year lies in `years`.
///
/// Steps without a single valid cell are skipped. A box selecting no grid
/// cells is an `EmptyRegion` error, as for a single field.
pub fn regional_series(
    dataset: &Dataset,
    variable: &str,
    bbox: Option<&BoundingBox>,
    years: YearRange,
) -> Result<Vec<SeriesPoint>> {
    let index = time_steps(dataset, variable)?;

    let mut points = Vec::new();
    for &time in index.times().iter().filter(|t| years.contains(t.year())) {
        // Exact timestamps, so the tie-break never applies
        let field = resolve_dataset(dataset, variable, time, bbox, TieBreak::Earlier)?;
        match field.stats() {
            Some(stats) => points.push(SeriesPoint {
                time,
                mean_anomaly: stats.mean,
                cells: stats.count,
            }),
            None => debug!(time = %time, "No valid cells, step left out of series"),
        }
    }

    debug!(
        steps = points.len(),
        start = years.start(),
        end = years.end(),
        "Computed regional series"
    );
    Ok(points)
}
