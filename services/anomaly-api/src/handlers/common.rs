//! Shared request parsing and error responses.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use anomaly_resolver::{ResolverError, YearRange};
use sst_common::{find_preset, parse_datetime, BoundingBox};

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub description: String,
}

pub fn error_response(status: StatusCode, code: &str, description: impl Into<String>) -> Response {
    let body = ErrorResponse {
        code: code.to_string(),
        description: description.into(),
    };
    let json = serde_json::to_string(&body).unwrap_or_default();
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        json,
    )
        .into_response()
}

/// Map a resolver error that was not turned into a fallback.
pub fn resolver_error_response(err: &ResolverError) -> Response {
    match err {
        ResolverError::EmptyRegion { .. } => {
            error_response(StatusCode::NOT_FOUND, "EmptyRegion", err.to_string())
        }
        ResolverError::MalformedCoordinates(_) => {
            error_response(StatusCode::BAD_GATEWAY, "MalformedCoordinates", err.to_string())
        }
        ResolverError::DataUnavailable(_) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, "DataUnavailable", err.to_string())
        }
    }
}

/// Query parameters shared by the anomaly endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct AnomalyParams {
    /// Requested date or datetime; today (UTC) when absent.
    pub date: Option<String>,

    /// `lat_min,lat_max,lon_min,lon_max`; wins over `region`.
    pub bbox: Option<String>,

    /// Region preset key, see `/regions`.
    pub region: Option<String>,
}

impl AnomalyParams {
    /// Parse into a target time and optional bbox, or a 400 response.
    pub fn parse(&self) -> Result<(DateTime<Utc>, Option<BoundingBox>), Response> {
        let target = match self.date.as_deref().map(str::trim) {
            Some(date) if !date.is_empty() => parse_datetime(date).map_err(|e| {
                error_response(StatusCode::BAD_REQUEST, "InvalidParameterValue", e.to_string())
            })?,
            _ => Utc::now(),
        };

        let bbox = parse_area(self.bbox.as_deref(), self.region.as_deref())?;
        Ok((target, bbox))
    }
}

fn invalid(description: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, "InvalidParameterValue", description)
}

/// An explicit `bbox` wins over a `region` preset; neither means global.
fn parse_area(bbox: Option<&str>, region: Option<&str>) -> Result<Option<BoundingBox>, Response> {
    match (bbox, region) {
        (Some(bbox), _) => BoundingBox::from_query_string(bbox)
            .map(Some)
            .map_err(|e| invalid(e.to_string())),
        (None, Some(region)) => find_preset(region)
            .map(|preset| Some(preset.bbox))
            .ok_or_else(|| invalid(format!("Unknown region '{}'", region))),
        (None, None) => Ok(None),
    }
}

/// First year of a series when `start_year` is absent.
pub const DEFAULT_START_YEAR: i32 = 2000;

/// Years averaged for the baseline when `baseline_years` is absent.
pub const DEFAULT_BASELINE_YEARS: u32 = 10;

/// Longest series served in one request.
pub const MAX_SERIES_YEARS: i32 = 200;

/// Query parameters of the series endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SeriesParams {
    pub bbox: Option<String>,
    pub region: Option<String>,

    /// Defaults to [`DEFAULT_START_YEAR`].
    pub start_year: Option<i32>,

    /// Defaults to the current year.
    pub end_year: Option<i32>,

    /// Rebase on the mean of the first N years; 0 keeps the source anomalies.
    pub baseline_years: Option<u32>,

    /// `yearly` for one row per year in CSV downloads.
    pub aggregate: Option<String>,
}

/// Parsed series request.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesQuery {
    pub bbox: Option<BoundingBox>,
    pub years: YearRange,
    pub baseline_years: Option<u32>,
    pub yearly: bool,
}

impl SeriesParams {
    pub fn parse(&self) -> Result<SeriesQuery, Response> {
        let bbox = parse_area(self.bbox.as_deref(), self.region.as_deref())?;

        let start = self.start_year.unwrap_or(DEFAULT_START_YEAR);
        let end = self.end_year.unwrap_or_else(|| Utc::now().year());
        let years = YearRange::new(start, end)
            .ok_or_else(|| invalid(format!("Invalid year range {}..{}", start, end)))?;
        if end - start >= MAX_SERIES_YEARS {
            return Err(invalid(format!(
                "Year range {}..{} exceeds {} years",
                start, end, MAX_SERIES_YEARS
            )));
        }

        let baseline_years = match self.baseline_years.unwrap_or(DEFAULT_BASELINE_YEARS) {
            0 => None,
            n => Some(n),
        };

        let yearly = match self.aggregate.as_deref().map(str::trim) {
            None | Some("") | Some("none") => false,
            Some(agg) if agg.eq_ignore_ascii_case("yearly") => true,
            Some(other) => return Err(invalid(format!("Unknown aggregate '{}'", other))),
        };

        Ok(SeriesQuery {
            bbox,
            years,
            baseline_years,
            yearly,
        })
    }
}
