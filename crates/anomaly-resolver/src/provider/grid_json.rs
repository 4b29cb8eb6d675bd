//! Decoder for the JSON grid payload.
//!
//! ```json
//! {
//!   "coordinates": {
//!     "time": ["2023-07-15T12:00:00Z"],
//!     "zlev": [0.0],
//!     "latitude": [-0.5, 0.5],
//!     "longitude": [179.5, 180.5]
//!   },
//!   "variables": {
//!     "anom": {
//!       "dims": ["time", "zlev", "latitude", "longitude"],
//!       "data": [0.1, null, 0.3, 0.4],
//!       "fill_value": -999.0
//!     }
//!   }
//! }
//! ```
//!
//! `data` is flat and row-major over `dims`. `null` cells become NaN. Time
//! coordinates may be ISO 8601 strings or epoch seconds.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use sst_common::time::parse_datetime;

use crate::array::{Coordinate, Dataset, Dimension, LabeledArray};
use crate::axes::{classify, AxisRole};
use crate::error::{ResolverError, Result};

#[derive(Debug, Deserialize)]
struct GridPayload {
    coordinates: BTreeMap<String, Vec<Value>>,
    variables: BTreeMap<String, VariablePayload>,
}

#[derive(Debug, Deserialize)]
struct VariablePayload {
    dims: Vec<String>,
    data: Vec<Option<f32>>,
    #[serde(default)]
    fill_value: Option<f32>,
}

fn decode_time(name: &str, value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_datetime(s)
            .map_err(|e| ResolverError::unavailable(format!("coordinate '{}': {}", name, e))),
        Value::Number(n) => n
            .as_f64()
            .and_then(|secs| {
                let whole = secs.floor();
                let nanos = ((secs - whole) * 1e9).round() as u32;
                DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
            })
            .ok_or_else(|| {
                ResolverError::unavailable(format!("coordinate '{}': bad epoch {}", name, n))
            }),
        other => Err(ResolverError::unavailable(format!(
            "coordinate '{}': expected a timestamp, got {}",
            name, other
        ))),
    }
}

fn decode_coordinate(name: &str, values: &[Value]) -> Result<Coordinate> {
    if classify(name) == Some(AxisRole::Time) {
        let times = values
            .iter()
            .map(|v| decode_time(name, v))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Coordinate::Time(times));
    }

    let numbers = values
        .iter()
        .map(|v| {
            v.as_f64().ok_or_else(|| {
                ResolverError::unavailable(format!(
                    "coordinate '{}': expected a number, got {}",
                    name, v
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Coordinate::Values(numbers))
}

/// Decode `variable` from a JSON grid payload into a dataset.
///
/// Other variables (bounds, masks) are ignored, along with the coordinates
/// only they use.
pub fn decode_grid(body: &str, variable: &str) -> Result<Dataset> {
    let mut payload: GridPayload = serde_json::from_str(body)?;

    let Some(anom) = payload.variables.remove(variable) else {
        let found: Vec<&str> = payload.variables.keys().map(String::as_str).collect();
        return Err(ResolverError::unavailable(format!(
            "payload has no '{}' variable (found: [{}])",
            variable,
            found.join(", ")
        )));
    };

    let dims = anom
        .dims
        .iter()
        .map(|dim| {
            let values = payload.coordinates.get(dim).ok_or_else(|| {
                ResolverError::malformed(format!(
                    "variable '{}' uses dimension '{}' without coordinates",
                    variable, dim
                ))
            })?;
            Ok(Dimension::new(dim.clone(), decode_coordinate(dim, values)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let values = anom.data.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect();
    let array = LabeledArray::new(dims, values, anom.fill_value)?;
    Ok(Dataset::new().with_variable(variable, array))
}
