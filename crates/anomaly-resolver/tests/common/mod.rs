//! Shared fixtures: OISST-like datasets with predictable values.
//!
//! Every cell's value is derived from its coordinates, not its index, so
//! datasets that differ only in layout (descending latitudes, lon-major
//! order, 0..360 longitudes, alternative axis names) must resolve to
//! identical fields.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use anomaly_resolver::{Coordinate, Dataset, Dimension, LabeledArray};
use sst_common::wrap_longitude;

pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// Value stored at time step `t` and the cell centred on (`lat`, `lon`).
pub fn encode(t: usize, lat: f64, lon: f64) -> f32 {
    let lat_part = (lat + 90.0).floor() as usize;
    let lon_part = (wrap_longitude(lon) + 180.0).floor() as usize;
    (t * 1_000_000 + lat_part * 1000 + lon_part) as f32
}

/// Time axis used by most tests.
///
/// 2023-07-16 sits exactly between two steps.
pub fn default_times() -> Vec<DateTime<Utc>> {
    vec![
        day(1981, 9, 1),
        day(2023, 7, 14),
        day(2023, 7, 15),
        day(2023, 7, 17),
        day(2024, 6, 30),
    ]
}

#[derive(Debug, Clone)]
pub struct Fixture {
    pub times: Vec<DateTime<Utc>>,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub time_name: &'static str,
    pub lat_name: &'static str,
    pub lon_name: &'static str,
    pub level_name: Option<&'static str>,
    pub lon_major: bool,
    pub variable: &'static str,
    pub fill_value: Option<f32>,
}

impl Default for Fixture {
    /// Global 1-degree grid, cell centres, signed longitudes, with `zlev`.
    fn default() -> Self {
        Self {
            times: default_times(),
            lats: (0..180).map(|i| -89.5 + i as f64).collect(),
            lons: (0..360).map(|i| -179.5 + i as f64).collect(),
            time_name: "time",
            lat_name: "latitude",
            lon_name: "longitude",
            level_name: Some("zlev"),
            lon_major: false,
            variable: "anom",
            fill_value: None,
        }
    }
}

impl Fixture {
    pub fn descending_lats(mut self) -> Self {
        self.lats.reverse();
        self
    }

    pub fn lons_0_360(mut self) -> Self {
        self.lons = (0..360).map(|i| 0.5 + i as f64).collect();
        self
    }

    pub fn lon_major(mut self) -> Self {
        self.lon_major = true;
        self
    }

    pub fn names(mut self, time: &'static str, lat: &'static str, lon: &'static str) -> Self {
        self.time_name = time;
        self.lat_name = lat;
        self.lon_name = lon;
        self
    }

    pub fn level(mut self, level: Option<&'static str>) -> Self {
        self.level_name = level;
        self
    }

    pub fn array(&self) -> LabeledArray {
        let mut dims = vec![Dimension::new(
            self.time_name,
            Coordinate::Time(self.times.clone()),
        )];
        // Two levels; only the first carries the encoded values
        if let Some(level) = self.level_name {
            dims.push(Dimension::new(level, Coordinate::Values(vec![0.0, 10.0])));
        }
        let lat_dim = Dimension::new(self.lat_name, Coordinate::Values(self.lats.clone()));
        let lon_dim = Dimension::new(self.lon_name, Coordinate::Values(self.lons.clone()));
        if self.lon_major {
            dims.push(lon_dim);
            dims.push(lat_dim);
        } else {
            dims.push(lat_dim);
            dims.push(lon_dim);
        }

        let levels = if self.level_name.is_some() { 2 } else { 1 };
        let mut values = Vec::new();
        for t in 0..self.times.len() {
            for level in 0..levels {
                let (outer, inner) = if self.lon_major {
                    (&self.lons, &self.lats)
                } else {
                    (&self.lats, &self.lons)
                };
                for &o in outer {
                    for &i in inner {
                        let (lat, lon) = if self.lon_major { (i, o) } else { (o, i) };
                        values.push(if level == 0 {
                            encode(t, lat, lon)
                        } else {
                            f32::NAN
                        });
                    }
                }
            }
        }

        LabeledArray::new(dims, values, self.fill_value).unwrap()
    }

    pub fn dataset(&self) -> Dataset {
        Dataset::new().with_variable(self.variable, self.array())
    }
}

/// Small JSON grid straddling the dateline on a 0..360 axis.
pub const DATELINE_GRID_JSON: &str = r#"{
    "coordinates": {
        "time": ["2023-07-14T12:00:00Z", "2023-07-15T12:00:00Z"],
        "zlev": [0.0],
        "latitude": [-1.0, 0.0, 1.0],
        "longitude": [178.5, 179.5, 180.5, 181.5]
    },
    "variables": {
        "anom": {
            "dims": ["time", "zlev", "latitude", "longitude"],
            "data": [
                0.0, 0.1, 0.2, 0.3,
                1.0, 1.1, 1.2, 1.3,
                2.0, 2.1, 2.2, 2.3,
                10.0, 10.1, 10.2, 10.3,
                11.0, null, 11.2, 11.3,
                12.0, 12.1, 12.2, -999.0
            ],
            "fill_value": -999.0
        }
    }
}"#;

/// The same cells as [`DATELINE_GRID_JSON`] for the second time step, as an ERDDAP CSV table.
pub const DATELINE_TABLE_CSV: &str = "\
time,zlev,latitude,longitude,anom
UTC,m,degrees_north,degrees_east,degree_C
2023-07-15T12:00:00Z,0.0,-1.0,179.5,10.1
2023-07-15T12:00:00Z,0.0,-1.0,180.5,10.2
2023-07-15T12:00:00Z,0.0,0.0,179.5,NaN
2023-07-15T12:00:00Z,0.0,0.0,180.5,11.2
2023-07-15T12:00:00Z,0.0,1.0,179.5,12.1
";
