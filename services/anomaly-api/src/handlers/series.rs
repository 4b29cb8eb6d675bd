//! Regional series handlers (JSON and CSV download).

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sst_common::BoundingBox;
use tracing::{error, info};

use anomaly_resolver::{
    write_series_csv, write_yearly_csv, SeriesOutcome, SeriesPoint, YearRange, YearlyMean,
};

use super::anomaly::DATA_SOURCE_HEADER;
use super::common::{error_response, resolver_error_response, SeriesParams, SeriesQuery};
use crate::state::AppState;

/// JSON body of `GET /series`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SeriesResponse {
    pub source: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    pub bbox: Option<BoundingBox>,

    pub years: YearRange,

    /// Years averaged for the baseline, `None` when not rebased.
    pub baseline_years: Option<u32>,

    pub points: Vec<SeriesPoint>,

    pub yearly: Vec<YearlyMean>,
}

impl SeriesResponse {
    pub fn from_outcome(outcome: &SeriesOutcome) -> Self {
        let series = outcome.series();
        Self {
            source: outcome.label().to_string(),
            warning: outcome.reason().map(|reason| {
                format!(
                    "Observed data unavailable ({}); showing an illustrative synthetic series",
                    reason
                )
            }),
            bbox: series.bbox,
            years: series.years,
            baseline_years: series.baseline_years,
            points: series.points.clone(),
            yearly: series.yearly(),
        }
    }
}

async fn compute(
    state: &AppState,
    params: &SeriesParams,
    endpoint: &'static str,
) -> Result<(SeriesQuery, SeriesOutcome), Response> {
    metrics::counter!("anomaly_http_requests_total", "endpoint" => endpoint).increment(1);
    let query = params.parse()?;

    let outcome = state
        .service
        .series(query.bbox, query.years, query.baseline_years)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to compute regional series");
            resolver_error_response(&e)
        })?;

    info!(
        start = query.years.start(),
        end = query.years.end(),
        steps = outcome.series().points.len(),
        source = outcome.label(),
        "Served regional series"
    );
    Ok((query, outcome))
}

fn source_header(outcome: &SeriesOutcome) -> (&'static str, HeaderValue) {
    (DATA_SOURCE_HEADER, HeaderValue::from_static(outcome.label()))
}

/// GET /series
pub async fn series_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SeriesParams>,
) -> Response {
    match compute(&state, &params, "series_json").await {
        Ok((_, outcome)) => (
            [source_header(&outcome)],
            Json(SeriesResponse::from_outcome(&outcome)),
        )
            .into_response(),
        Err(response) => response,
    }
}

/// GET /series/csv - per-step rows, or one row per year with `aggregate=yearly`
pub async fn series_csv_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SeriesParams>,
) -> Response {
    let (query, outcome) = match compute(&state, &params, "series_csv").await {
        Ok(computed) => computed,
        Err(response) => return response,
    };

    let series = outcome.series();
    let mut body = Vec::new();
    let written = if query.yearly {
        write_yearly_csv(&series.yearly(), &mut body)
    } else {
        write_series_csv(&series.points, &mut body)
    };
    if let Err(e) = written {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "NoApplicableCode",
            format!("Failed to write CSV: {}", e),
        );
    }

    let disposition = format!(
        "attachment; filename=\"sst_anomaly_series_{}_{}{}.csv\"",
        query.years.start(),
        query.years.end(),
        if query.yearly { "_yearly" } else { "" }
    );

    (
        StatusCode::OK,
        [
            ("content-type", HeaderValue::from_static("text/csv")),
            (
                "content-disposition",
                HeaderValue::from_str(&disposition)
                    .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
            ),
            source_header(&outcome),
        ],
        body,
    )
        .into_response()
}
