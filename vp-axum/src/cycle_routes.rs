//! REST API endpoints for ingestion cycles.

use crate::internal;
use aide::axum::{
    ApiRouter,
    routing::{get, post},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use schemars::JsonSchema;
use vp_core::models::{CycleReport, CycleSummary, CycleTag};
use vp_core::ports::{Application, CycleRepository as _};

/// Path parameter for cycle-specific endpoints.
#[derive(serde::Deserialize, JsonSchema)]
struct TagPath {
    /// The cycle tag, e.g. `2025-07`
    tag: String,
}

/// Query parameters for triggering a cycle.
#[derive(serde::Deserialize, JsonSchema)]
struct RunCycleQuery {
    /// Cycle tag to ingest under; defaults to the current UTC year-month
    #[serde(default)]
    tag: Option<CycleTag>,
}

/// Creates a router with cycle endpoints.
pub fn router<T: Application>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route("/", post(run_cycle::<T>))
        .api_route("/{tag}/summary", get(cycle_summary::<T>))
}

/// Run an ingestion cycle now.
///
/// Downloads recent mailbox attachments, identifies and extracts each
/// vendor feed, stages and promotes the rows, and generates pending
/// proposals. The response is the full run report.
///
/// # Returns
///
/// - `200 OK`: The cycle report
/// - `500 Internal Server Error`: The cycle failed partway
async fn run_cycle<T: Application>(
    State(app): State<T>,
    Query(RunCycleQuery { tag }): Query<RunCycleQuery>,
) -> Result<Json<CycleReport>, (StatusCode, String)> {
    let cycle = tag.unwrap_or_else(|| CycleTag::from_datetime(app.now()));

    let report = app
        .run_cycle(cycle)
        .await
        .map_err(internal("ingestion cycle failed"))?;

    Ok(Json(report))
}

/// Row-count breakdown of a past cycle.
///
/// # Returns
///
/// - `200 OK`: Movement, vendor cost and proposal counts for the cycle
/// - `400 Bad Request`: Malformed cycle tag
/// - `404 Not Found`: No data recorded under that tag
/// - `500 Internal Server Error`: Database query failed
async fn cycle_summary<T: Application>(
    State(app): State<T>,
    Path(TagPath { tag }): Path<TagPath>,
) -> Result<Json<CycleSummary>, (StatusCode, String)> {
    let cycle: CycleTag = tag
        .parse()
        .map_err(|err| (StatusCode::BAD_REQUEST, format!("{err}")))?;

    let summary = app
        .database()
        .cycle_summary(&cycle)
        .await
        .map_err(internal("failed to summarize cycle"))?
        .ok_or((
            StatusCode::NOT_FOUND,
            format!("no data recorded for cycle {cycle}"),
        ))?;

    Ok(Json(summary))
}
