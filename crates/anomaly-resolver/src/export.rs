//! CSV export of resolved fields and regional series.

use std::io::Write;

use chrono::SecondsFormat;
use sst_common::GriddedAnomalyField;

use crate::series::{SeriesPoint, YearlyMean};

/// Column header of exported files.
pub const CSV_HEADER: [&str; 3] = ["lat", "lon", "anomaly"];

pub const SERIES_CSV_HEADER: [&str; 3] = ["time", "mean_anomaly", "cells"];

pub const YEARLY_CSV_HEADER: [&str; 3] = ["year", "mean_anomaly", "steps"];

/// Write one `lat,lon,anomaly` row per non-missing cell, latitude-major.
pub fn write_csv<W: Write>(field: &GriddedAnomalyField, writer: W) -> Result<(), csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;
    for (lat, lon, value) in field.valid_cells() {
        csv.serialize((lat, lon, value))?;
    }
    csv.flush()?;
    Ok(())
}

/// Render a field as a CSV string.
pub fn to_csv(field: &GriddedAnomalyField) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    write_csv(field, &mut buf)?;
    // csv only ever writes the UTF-8 it was given
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write one `time,mean_anomaly,cells` row per series step.
pub fn write_series_csv<W: Write>(points: &[SeriesPoint], writer: W) -> Result<(), csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(SERIES_CSV_HEADER)?;
    for point in points {
        let time = point.time.to_rfc3339_opts(SecondsFormat::Secs, true);
        csv.serialize((time, point.mean_anomaly, point.cells))?;
    }
    csv.flush()?;
    Ok(())
}

/// Write one `year,mean_anomaly,steps` row per year.
pub fn write_yearly_csv<W: Write>(yearly: &[YearlyMean], writer: W) -> Result<(), csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(YEARLY_CSV_HEADER)?;
    for year in yearly {
        csv.serialize((year.year, year.mean_anomaly, year.steps))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn series_to_csv(points: &[SeriesPoint]) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    write_series_csv(points, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_to_csv_skips_missing() {
        let field = GriddedAnomalyField::new(
            Utc.with_ymd_and_hms(2023, 7, 15, 0, 0, 0).unwrap(),
            vec![10.0, 11.0],
            vec![120.0, 121.5],
            vec![0.5, f32::NAN, -999.0, -1.25],
            Some(-999.0),
        )
        .unwrap();

        let csv = to_csv(&field).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec!["lat,lon,anomaly", "10.0,120.0,0.5", "11.0,121.5,-1.25"]);
    }

    #[test]
    fn test_all_missing_has_header_only() {
        let field = GriddedAnomalyField::new(
            Utc.with_ymd_and_hms(2023, 7, 15, 0, 0, 0).unwrap(),
            vec![0.0],
            vec![0.0],
            vec![f32::NAN],
            None,
        )
        .unwrap();
        assert_eq!(to_csv(&field).unwrap(), "lat,lon,anomaly\n");
        assert!(field.stats().is_none());
    }

    #[test]
    fn test_series_csv() {
        let points = vec![
            SeriesPoint {
                time: Utc.with_ymd_and_hms(2000, 1, 15, 0, 0, 0).unwrap(),
                mean_anomaly: 0.25,
                cells: 12,
            },
            SeriesPoint {
                time: Utc.with_ymd_and_hms(2000, 2, 15, 0, 0, 0).unwrap(),
                mean_anomaly: -0.5,
                cells: 11,
            },
        ];
        let csv = series_to_csv(&points).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "time,mean_anomaly,cells",
                "2000-01-15T00:00:00Z,0.25,12",
                "2000-02-15T00:00:00Z,-0.5,11",
            ]
        );
    }

    #[test]
    fn test_yearly_csv() {
        let yearly = vec![YearlyMean {
            year: 2001,
            mean_anomaly: 1.5,
            steps: 12,
        }];
        let mut buf = Vec::new();
        write_yearly_csv(&yearly, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "year,mean_anomaly,steps\n2001,1.5,12\n");
    }
}
