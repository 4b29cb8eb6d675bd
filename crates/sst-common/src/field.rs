//! Resolved anomaly fields and their summary statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A 2-D grid of temperature anomalies (°C) at a single time step.
///
/// Values are stored row-major: one row per latitude (ascending), one column
/// per longitude. Missing cells keep whatever marker the source used; NaN and
/// the declared `fill_value` both count as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GriddedAnomalyField {
    timestamp: DateTime<Utc>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    values: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fill_value: Option<f32>,
}

impl GriddedAnomalyField {
    /// Create a field, rejecting values whose length does not match the axes.
    pub fn new(
        timestamp: DateTime<Utc>,
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
        values: Vec<f32>,
        fill_value: Option<f32>,
    ) -> Result<Self, FieldShapeError> {
        let expected = latitudes.len() * longitudes.len();
        if values.len() != expected {
            return Err(FieldShapeError {
                lat: latitudes.len(),
                lon: longitudes.len(),
                values: values.len(),
            });
        }

        Ok(Self {
            timestamp,
            latitudes,
            longitudes,
            values,
            fill_value,
        })
    }

    /// The resolved observation time.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn fill_value(&self) -> Option<f32> {
        self.fill_value
    }

    /// `(rows, columns)` = `(latitudes, longitudes)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.latitudes.len(), self.longitudes.len())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value at a grid position, missing markers included.
    pub fn get(&self, lat_idx: usize, lon_idx: usize) -> Option<f32> {
        if lat_idx >= self.latitudes.len() || lon_idx >= self.longitudes.len() {
            return None;
        }
        Some(self.values[lat_idx * self.longitudes.len() + lon_idx])
    }

    /// Check whether a raw value is a missing-data marker for this field.
    pub fn is_missing(&self, value: f32) -> bool {
        value.is_nan() || self.fill_value.is_some_and(|fill| value == fill)
    }

    /// Iterate `(lat, lon, value)` over non-missing cells in row-major order.
    pub fn valid_cells(&self) -> impl Iterator<Item = (f64, f64, f32)> + '_ {
        let ncols = self.longitudes.len();
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| !self.is_missing(**v))
            .map(move |(i, v)| (self.latitudes[i / ncols], self.longitudes[i % ncols], *v))
    }

    /// Summary statistics over non-missing cells; `None` when all are missing.
    pub fn stats(&self) -> Option<FieldStats> {
        let mut count = 0usize;
        let mut sum = 0.0f64;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;

        for (_, _, value) in self.valid_cells() {
            count += 1;
            sum += value as f64;
            min = min.min(value);
            max = max.max(value);
        }

        if count == 0 {
            return None;
        }

        Some(FieldStats {
            count,
            mean: sum / count as f64,
            min,
            max,
        })
    }
}

/// Summary statistics of the non-missing values of a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub count: usize,
    pub mean: f64,
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, thiserror::Error)]
#[error("field shape mismatch: {lat} latitudes x {lon} longitudes but {values} values")]
pub struct FieldShapeError {
    pub lat: usize,
    pub lon: usize,
    pub values: usize,
}
