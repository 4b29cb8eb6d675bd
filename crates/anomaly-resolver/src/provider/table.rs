//! Decoder for delimited-text (CSV) table payloads.
//!
//! One row per grid cell with time, latitude, longitude and value columns (and
//! optionally a vertical level column). ERDDAP-style responses carry a units
//! row directly under the header; it is skipped. Rows are densified into a
//! `time x [level] x lat x lon` array with NaN for cells the table omits.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use sst_common::time::parse_datetime;
use tracing::debug;

use crate::array::{Coordinate, Dataset, Dimension, LabeledArray};
use crate::axes::{classify, AxisRole};
use crate::error::{ResolverError, Result};

struct Columns {
    time: (usize, String),
    level: Option<(usize, String)>,
    lat: (usize, String),
    lon: (usize, String),
    value: usize,
}

fn find_columns(headers: &csv::StringRecord, variable: &str) -> Result<Columns> {
    let (mut time, mut level, mut lat, mut lon, mut value) = (None, None, None, None, None);

    for (i, header) in headers.iter().enumerate() {
        let header = header.trim();
        if header.eq_ignore_ascii_case(variable) {
            value = Some(i);
            continue;
        }
        let slot = match classify(header) {
            Some(AxisRole::Time) => &mut time,
            Some(AxisRole::Level) => &mut level,
            Some(AxisRole::Latitude) => &mut lat,
            Some(AxisRole::Longitude) => &mut lon,
            // Other columns (quality flags, ids) are not part of the grid
            None => continue,
        };
        if slot.replace((i, header.to_string())).is_some() {
            return Err(ResolverError::malformed(format!(
                "duplicate column for {}",
                header
            )));
        }
    }

    Ok(Columns {
        time: time.ok_or_else(|| ResolverError::unavailable("table has no time column"))?,
        level,
        lat: lat.ok_or_else(|| ResolverError::malformed("table has no latitude column"))?,
        lon: lon.ok_or_else(|| ResolverError::malformed("table has no longitude column"))?,
        value: value.ok_or_else(|| {
            ResolverError::unavailable(format!("table has no '{}' column", variable))
        })?,
    })
}

fn parse_number(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok()
}

fn parse_value(field: &str) -> Option<f32> {
    let field = field.trim();
    if field.is_empty() || field.eq_ignore_ascii_case("nan") {
        return Some(f32::NAN);
    }
    field.parse::<f32>().ok()
}

/// Sorted, de-duplicated axis values.
fn unique_sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values.dedup();
    values
}

fn position(axis: &[f64], value: f64) -> usize {
    // The value was collected into the axis, so the search always succeeds.
    axis.binary_search_by(|v| v.partial_cmp(&value).unwrap_or(Ordering::Less))
        .unwrap_or_default()
}

/// ERDDAP units row directly under the header, e.g.
/// `UTC,m,degrees_north,degrees_east,degree_C`: no numeric coordinate or value.
fn is_units_row(record: &csv::StringRecord, columns: &Columns) -> bool {
    let non_numeric = |i: usize| record.get(i).unwrap_or("").parse::<f64>().is_err();
    non_numeric(columns.lat.0) && non_numeric(columns.lon.0) && non_numeric(columns.value)
}

struct Row {
    time: DateTime<Utc>,
    level: f64,
    lat: f64,
    lon: f64,
    value: f32,
}

/// Decode a CSV table payload into a dataset holding `variable`.
pub fn decode_table(body: &str, variable: &str) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = find_columns(&headers, variable)?;

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let cell = |i: usize| record.get(i).unwrap_or("");

        let time = parse_datetime(cell(columns.time.0));
        let lat = parse_number(cell(columns.lat.0));
        let lon = parse_number(cell(columns.lon.0));
        let level = match &columns.level {
            Some((i, _)) => parse_number(cell(*i)),
            None => Some(0.0),
        };
        let value = parse_value(cell(columns.value));

        match (time, lat, lon, level, value) {
            (Ok(time), Some(lat), Some(lon), Some(level), Some(value)) => rows.push(Row {
                time,
                level,
                lat,
                lon,
                value,
            }),
            _ if idx == 0 && is_units_row(&record, &columns) => {
                debug!("Skipping units row in table payload");
            }
            _ => {
                // +2: one header line, 1-based line numbers
                return Err(ResolverError::unavailable(format!(
                    "unparseable table row at line {}",
                    idx + 2
                )));
            }
        }
    }

    if rows.is_empty() {
        return Err(ResolverError::unavailable("table payload has no rows"));
    }

    let mut times: Vec<DateTime<Utc>> = rows.iter().map(|r| r.time).collect();
    times.sort();
    times.dedup();
    let levels = unique_sorted(rows.iter().map(|r| r.level).collect());
    let lats = unique_sorted(rows.iter().map(|r| r.lat).collect());
    let lons = unique_sorted(rows.iter().map(|r| r.lon).collect());

    let (nl, ny, nx) = (levels.len(), lats.len(), lons.len());
    let mut values = vec![f32::NAN; times.len() * nl * ny * nx];
    let mut filled = vec![false; values.len()];
    for row in &rows {
        let t = times.binary_search(&row.time).unwrap_or_default();
        let l = position(&levels, row.level);
        let y = position(&lats, row.lat);
        let x = position(&lons, row.lon);
        let cell = ((t * nl + l) * ny + y) * nx + x;
        if std::mem::replace(&mut filled[cell], true) {
            return Err(ResolverError::malformed(format!(
                "duplicate table rows for time {}, level {}, lat {}, lon {}",
                row.time, row.level, row.lat, row.lon
            )));
        }
        values[cell] = row.value;
    }

    let mut dims = vec![Dimension::new(columns.time.1, Coordinate::Time(times))];
    if let Some((_, name)) = columns.level {
        dims.push(Dimension::new(name, Coordinate::Values(levels)));
    }
    dims.push(Dimension::new(columns.lat.1, Coordinate::Values(lats)));
    dims.push(Dimension::new(columns.lon.1, Coordinate::Values(lons)));

    let array = LabeledArray::new(dims, values, None)?;
    Ok(Dataset::new().with_variable(variable, array))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERDDAP_CSV: &str = "\
time,zlev,latitude,longitude,anom
UTC,m,degrees_north,degrees_east,degree_C
2023-07-15T12:00:00Z,0.0,10.125,120.125,0.5
2023-07-15T12:00:00Z,0.0,10.125,120.375,NaN
2023-07-15T12:00:00Z,0.0,10.375,120.125,-0.25
";

    #[test]
    fn test_decode_erddap_csv() {
        let dataset = decode_table(ERDDAP_CSV, "anom").unwrap();
        let anom = dataset.variable("anom").unwrap();

        assert_eq!(anom.shape(), vec![1, 1, 2, 2]);
        assert_eq!(anom.dims()[2].name, "latitude");
        assert_eq!(anom.get(&[0, 0, 0, 0]), Some(0.5));
        assert!(anom.get(&[0, 0, 0, 1]).unwrap().is_nan());
        assert_eq!(anom.get(&[0, 0, 1, 0]), Some(-0.25));
        // Omitted cell
        assert!(anom.get(&[0, 0, 1, 1]).unwrap().is_nan());
    }

    #[test]
    fn test_decode_without_level_column() {
        let body = "date,lat,lon,ANOM\n2023-07-15,1.0,2.0,0.75\n";
        let dataset = decode_table(body, "anom").unwrap();
        let anom = dataset.variable("anom").unwrap();
        assert_eq!(anom.shape(), vec![1, 1, 1]);
        assert_eq!(anom.get(&[0, 0, 0]), Some(0.75));
    }

    #[test]
    fn test_missing_value_column() {
        let body = "time,lat,lon,sst\n2023-07-15,1.0,2.0,20.5\n";
        let result = decode_table(body, "anom");
        assert!(matches!(result, Err(ResolverError::DataUnavailable(_))));
    }

    #[test]
    fn test_bad_first_data_row_is_reported() {
        // Numeric cells with a broken date: a damaged row, not a units row
        let body = "time,lat,lon,anom\n2023-07-1x,1.0,2.0,0.1\n2023-07-15,1.0,3.0,0.2\n";
        match decode_table(body, "anom") {
            Err(ResolverError::DataUnavailable(msg)) => assert!(msg.contains("line 2"), "{}", msg),
            other => panic!("Expected DataUnavailable, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_duplicate_cells_are_malformed() {
        let body = "\
time,lat,lon,anom
2023-07-15,1.0,2.0,0.1
2023-07-15,1.0,3.0,0.2
2023-07-15,1.0,2.0,0.3
";
        let result = decode_table(body, "anom");
        assert!(matches!(result, Err(ResolverError::MalformedCoordinates(_))));
    }

    #[test]
    fn test_bad_row_after_first() {
        let body = "time,lat,lon,anom\n2023-07-15,1.0,2.0,0.1\nnot-a-date,1.0,2.0,0.1\n";
        let result = decode_table(body, "anom");
        assert!(matches!(result, Err(ResolverError::DataUnavailable(_))));
    }
}
