//! REST API endpoints for price proposal review.

use crate::{config::AxumConfig, internal};
use aide::axum::{
    ApiRouter,
    routing::{get, post, put},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use std::sync::Arc;
use vp_core::models::{PriceProposal, ProposalQuery};
use vp_core::ports::{Application, ProposalFailure, ProposalRepository as _};

/// Path parameter for proposal-specific endpoints.
#[derive(serde::Deserialize, JsonSchema)]
struct Id {
    /// The unique identifier of the proposal
    id: i64,
}

/// Request body for recording a reviewer's price edit.
#[derive(serde::Deserialize, JsonSchema)]
#[schemars(inline)]
struct EditProposalRequest {
    /// The price the reviewer wants instead of the computed one
    #[schemars(schema_with = "decimal_schema")]
    edited_price: Decimal,
}

fn decimal_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "string",
        "format": "decimal",
    })
}

/// Creates a router with proposal review endpoints.
pub fn router<T: Application>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route("/", get(list_proposals::<T>))
        .api_route("/{id}", put(edit_proposal::<T>))
        .api_route("/{id}/approve", post(approve_proposal::<T>))
}

/// List proposals, optionally filtered by cycle and status.
///
/// # Returns
///
/// - `200 OK`: Proposals, newest first, capped by the server page limit
/// - `500 Internal Server Error`: Database query failed
async fn list_proposals<T: Application>(
    State(app): State<T>,
    Extension(config): Extension<Arc<AxumConfig>>,
    Query(query): Query<ProposalQuery>,
) -> Result<Json<Vec<PriceProposal>>, (StatusCode, String)> {
    let proposals = app
        .database()
        .list_proposals(&query, config.page_limit)
        .await
        .map_err(internal("failed to list proposals"))?;

    Ok(Json(proposals))
}

/// Record a reviewer's price override on a pending proposal.
///
/// # Returns
///
/// - `200 OK`: The updated proposal
/// - `404 Not Found`: No proposal with that id
/// - `409 Conflict`: The proposal is no longer pending
/// - `500 Internal Server Error`: Database operation failed
async fn edit_proposal<T: Application>(
    State(app): State<T>,
    Path(Id { id }): Path<Id>,
    Json(request): Json<EditProposalRequest>,
) -> Result<Json<PriceProposal>, (StatusCode, String)> {
    let outcome = app
        .database()
        .edit_proposal(id, request.edited_price)
        .await
        .map_err(internal("failed to edit proposal"))?;

    outcome.map(Json).map_err(|failure| proposal_error(id, failure))
}

/// Approve a pending proposal.
///
/// # Returns
///
/// - `200 OK`: The approved proposal
/// - `404 Not Found`: No proposal with that id
/// - `409 Conflict`: The proposal is no longer pending
/// - `500 Internal Server Error`: Database operation failed
async fn approve_proposal<T: Application>(
    State(app): State<T>,
    Path(Id { id }): Path<Id>,
) -> Result<Json<PriceProposal>, (StatusCode, String)> {
    let outcome = app
        .database()
        .approve_proposal(id)
        .await
        .map_err(internal("failed to approve proposal"))?;

    outcome.map(Json).map_err(|failure| proposal_error(id, failure))
}

fn proposal_error(id: i64, failure: ProposalFailure) -> (StatusCode, String) {
    match failure {
        ProposalFailure::DoesNotExist => {
            (StatusCode::NOT_FOUND, format!("unknown proposal {id}"))
        }
        ProposalFailure::InvalidStatus => {
            (StatusCode::CONFLICT, format!("proposal {id} is not pending"))
        }
    }
}
