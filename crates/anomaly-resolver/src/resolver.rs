//! The anomaly field resolver.
//!
//! Turns a provider's labeled array into a 2-D lat/lon field at the time step
//! nearest to the request:
//!
//! ```text
//! provider.open()
//!      │
//!      ▼
//! Dataset ──► variable ──► classify axes (time / level / lat / lon)
//!                               │
//!                               ├─► clamp + nearest time step ──► select time
//!                               ├─► first vertical level (if any)
//!                               └─► lat ascending, lon signed, bbox slicing
//!                                        │
//!                                        ▼
//!                               GriddedAnomalyField
//! ```

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sst_common::{
    match_longitude, BoundingBox, GriddedAnomalyField, StepWindow, TieBreak, TimeIndex,
};
use tracing::{debug, instrument};

use crate::array::{Coordinate, Dataset, LabeledArray};
use crate::axes::{classify, AxisRole};
use crate::error::{ResolverError, Result};
use crate::provider::{AnomalyProvider, FieldRequest};
use crate::series::{regional_series, SeriesPoint, YearRange};

/// Resolves anomaly fields from a provider.
///
/// The resolver is stateless apart from its configuration; caching belongs to
/// the caller (see [`crate::service::AnomalyService`]).
pub struct AnomalyFieldResolver<P> {
    provider: P,
    variable: String,
    tie_break: TieBreak,
}

impl<P: AnomalyProvider> AnomalyFieldResolver<P> {
    /// Create a resolver reading `variable` from `provider`.
    pub fn new(provider: P, variable: impl Into<String>) -> Self {
        Self {
            provider,
            variable: variable.into(),
            tie_break: TieBreak::default(),
        }
    }

    /// Choose how equidistant time steps are resolved.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Fetch the dataset and resolve the field for `target` inside `bbox`.
    ///
    /// The dataset is dropped before returning. No retries are attempted.
    #[instrument(skip(self), fields(variable = %self.variable))]
    pub async fn resolve(
        &self,
        target: DateTime<Utc>,
        bbox: Option<&BoundingBox>,
    ) -> Result<GriddedAnomalyField> {
        self.resolve_step(target, bbox).await.map(|r| r.field)
    }

    /// Like [`resolve`](Self::resolve), also reporting which other targets
    /// would have produced the same time step.
    pub async fn resolve_step(
        &self,
        target: DateTime<Utc>,
        bbox: Option<&BoundingBox>,
    ) -> Result<ResolvedField> {
        let request = FieldRequest::at(target, bbox.copied());
        let dataset = self.provider.open(&request).await?;
        resolve_dataset_step(&dataset, &self.variable, target, bbox, self.tie_break)
    }

    /// Fetch every step in `years` and average the anomaly inside `bbox` at
    /// each one.
    #[instrument(skip(self), fields(variable = %self.variable))]
    pub async fn series(
        &self,
        bbox: Option<&BoundingBox>,
        years: YearRange,
    ) -> Result<Vec<SeriesPoint>> {
        let request = FieldRequest::over(years.period(), bbox.copied());
        let dataset = self.provider.open(&request).await?;
        regional_series(&dataset, &self.variable, bbox, years)
    }
}

/// A resolved field and the window of targets that select its time step.
#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub field: GriddedAnomalyField,
    pub window: StepWindow,
}

/// Positions of the classified dimensions in the source array.
#[derive(Debug)]
struct AxisLayout {
    time: usize,
    level: Option<usize>,
    lat: usize,
    lon: usize,
}

impl AxisLayout {
    fn classify(array: &LabeledArray) -> Result<Self> {
        let (mut time, mut level, mut lat, mut lon) = (None, None, None, None);

        for (i, dim) in array.dims().iter().enumerate() {
            let role = classify(&dim.name).ok_or_else(|| {
                ResolverError::malformed(format!("unrecognised dimension '{}'", dim.name))
            })?;
            let slot = match role {
                AxisRole::Time => &mut time,
                AxisRole::Level => &mut level,
                AxisRole::Latitude => &mut lat,
                AxisRole::Longitude => &mut lon,
            };
            if slot.replace(i).is_some() {
                return Err(ResolverError::malformed(format!(
                    "more than one {} dimension",
                    role
                )));
            }
        }

        Ok(Self {
            time: time.ok_or_else(|| ResolverError::unavailable("no time coordinate"))?,
            level,
            lat: lat.ok_or_else(|| ResolverError::malformed("no latitude dimension"))?,
            lon: lon.ok_or_else(|| ResolverError::malformed("no longitude dimension"))?,
        })
    }
}

/// Index of `axis` once the axes in `removed` have been dropped.
fn shifted(axis: usize, removed: &[usize]) -> usize {
    axis - removed.iter().filter(|&&r| r < axis).count()
}

fn degrees<'a>(array: &'a LabeledArray, axis: usize, role: AxisRole) -> Result<&'a [f64]> {
    match &array.dims()[axis].coordinate {
        Coordinate::Values(values) => {
            if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
                return Err(ResolverError::malformed(format!(
                    "non-finite {} coordinate {}",
                    role, bad
                )));
            }
            Ok(values)
        }
        Coordinate::Time(_) => Err(ResolverError::malformed(format!(
            "{} axis holds timestamps",
            role
        ))),
    }
}

/// Pick latitude positions inside the box, ascending by latitude.
fn select_latitudes(lats: &[f64], bbox: Option<&BoundingBox>) -> Vec<(usize, f64)> {
    let mut selected: Vec<(usize, f64)> = lats
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, lat)| bbox.map_or(true, |b| b.contains_lat(*lat)))
        .collect();
    selected.sort_by(|a, b| a.1.total_cmp(&b.1));
    selected
}

/// Pick longitude positions for each range in order, ascending within a range.
///
/// Returned longitudes are the representation inside the matching range, so a
/// `[0, 360)` source comes back in signed degrees. A meridian is emitted at
/// most once even when the source carries both `-180` and `180`.
fn select_longitudes(lons: &[f64], ranges: &[(f64, f64)]) -> Vec<(usize, f64)> {
    let meridian = |lon: f64| (((lon + 180.0).rem_euclid(360.0) - 180.0) * 1e6).round() as i64;

    let mut emitted = HashSet::new();
    let mut selected = Vec::new();
    for &range in ranges {
        let mut part: Vec<(usize, f64)> = lons
            .iter()
            .enumerate()
            .filter_map(|(i, &lon)| match_longitude(lon, range).map(|v| (i, v)))
            .collect();
        part.sort_by(|a, b| a.1.total_cmp(&b.1));
        selected.extend(part.into_iter().filter(|(_, v)| emitted.insert(meridian(*v))));
    }
    selected
}

fn anomaly_variable<'a>(dataset: &'a Dataset, variable: &str) -> Result<&'a LabeledArray> {
    dataset.variable(variable).ok_or_else(|| {
        let found: Vec<&str> = dataset.variable_names().collect();
        ResolverError::unavailable(format!(
            "dataset has no '{}' variable (found: [{}])",
            variable,
            found.join(", ")
        ))
    })
}

fn time_index(array: &LabeledArray, layout: &AxisLayout) -> Result<TimeIndex> {
    let times = match &array.dims()[layout.time].coordinate {
        Coordinate::Time(times) => times.clone(),
        Coordinate::Values(_) => {
            return Err(ResolverError::malformed("time axis does not hold timestamps"))
        }
    };
    TimeIndex::new(times).map_err(|e| ResolverError::unavailable(format!("invalid time axis: {}", e)))
}

/// Time steps of `variable` in the dataset, ascending.
pub fn time_steps(dataset: &Dataset, variable: &str) -> Result<TimeIndex> {
    let array = anomaly_variable(dataset, variable)?;
    let layout = AxisLayout::classify(array)?;
    time_index(array, &layout)
}

/// Resolve a field from an already fetched dataset.
pub fn resolve_dataset(
    dataset: &Dataset,
    variable: &str,
    target: DateTime<Utc>,
    bbox: Option<&BoundingBox>,
    tie_break: TieBreak,
) -> Result<GriddedAnomalyField> {
    resolve_dataset_step(dataset, variable, target, bbox, tie_break).map(|r| r.field)
}

/// [`resolve_dataset`] plus the window of targets sharing the resolved step.
pub fn resolve_dataset_step(
    dataset: &Dataset,
    variable: &str,
    target: DateTime<Utc>,
    bbox: Option<&BoundingBox>,
    tie_break: TieBreak,
) -> Result<ResolvedField> {
    let array = anomaly_variable(dataset, variable)?;
    let layout = AxisLayout::classify(array)?;
    let index = time_index(array, &layout)?;
    let (time_idx, resolved) = index.nearest(target, tie_break);

    debug!(
        requested = %target,
        resolved = %resolved,
        t_min = %index.first(),
        t_max = %index.last(),
        "Resolved time step"
    );

    let mut slice = array.select(layout.time, time_idx);
    let mut removed = vec![layout.time];

    if let Some(level) = layout.level {
        let axis = shifted(level, &removed);
        if slice.dims()[axis].is_empty() {
            return Err(ResolverError::unavailable("vertical axis has no levels"));
        }
        slice = slice.select(axis, 0);
        removed.push(level);
    }

    let lat_axis = shifted(layout.lat, &removed);
    let lon_axis = shifted(layout.lon, &removed);
    let lats = degrees(&slice, lat_axis, AxisRole::Latitude)?;
    let lons = degrees(&slice, lon_axis, AxisRole::Longitude)?;

    let lon_ranges = bbox
        .map(BoundingBox::longitude_ranges)
        .unwrap_or_else(|| vec![(-180.0, 180.0)]);
    let lat_sel = select_latitudes(lats, bbox);
    let lon_sel = select_longitudes(lons, &lon_ranges);

    if lat_sel.is_empty() || lon_sel.is_empty() {
        return Err(ResolverError::EmptyRegion {
            bbox: bbox.copied().unwrap_or_else(BoundingBox::global),
        });
    }

    let ncols = slice.dims()[1].len();
    let source = slice.values();
    let mut values = Vec::with_capacity(lat_sel.len() * lon_sel.len());
    for &(lat_i, _) in &lat_sel {
        for &(lon_i, _) in &lon_sel {
            let (row, col) = if lat_axis == 0 {
                (lat_i, lon_i)
            } else {
                (lon_i, lat_i)
            };
            values.push(source[row * ncols + col]);
        }
    }

    debug!(
        lat_count = lat_sel.len(),
        lon_count = lon_sel.len(),
        wraps = lon_ranges.len() > 1,
        "Sliced anomaly field"
    );

    let field = GriddedAnomalyField::new(
        resolved,
        lat_sel.into_iter().map(|(_, lat)| lat).collect(),
        lon_sel.into_iter().map(|(_, lon)| lon).collect(),
        values,
        slice.fill_value(),
    )?;
    Ok(ResolvedField {
        field,
        window: index.window(time_idx, tie_break),
    })
}
