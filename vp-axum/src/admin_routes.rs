//! REST API endpoints for database administration.
//!
//! These mirror the operational surface the service has always had:
//! schema creation, table listing, row counts, full-table dumps, test
//! data seeding and table clearing. Table names from the caller are
//! only ever resolved against the backend's fixed registry.

use crate::internal;
use aide::axum::{
    ApiRouter,
    routing::{get, post},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rand::Rng as _;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;
use vp_core::models::{Product, TableDump, TableInfo};
use vp_core::ports::{AdminRepository as _, Application, CatalogRepository as _};

/// Path parameter for table-specific endpoints.
#[derive(serde::Deserialize, JsonSchema)]
struct TablePath {
    /// The table to operate on
    table: String,
}

/// Creates a router with administration endpoints.
pub fn router<T: Application>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route(
            "/tables",
            get(list_tables::<T>).post(create_tables::<T>),
        )
        .api_route("/tables/counts", get(table_counts::<T>))
        .api_route("/tables/{table}", get(dump_table::<T>))
        .api_route("/clear", post(clear_tables::<T>))
        .api_route("/seed", post(seed_test_product::<T>))
}

/// Response for the table listing endpoint.
#[derive(Serialize, JsonSchema)]
#[schemars(inline)]
struct TablesResponse {
    /// Every known table with its columns
    tables: Vec<TableInfo>,
    /// Number of tables listed
    count: usize,
}

/// Response for the row count endpoint.
#[derive(Serialize, JsonSchema)]
#[schemars(inline)]
struct TableCountsResponse {
    /// Row count per table
    table_counts: BTreeMap<String, i64>,
}

/// Response for the clear endpoint.
#[derive(Serialize, JsonSchema)]
#[schemars(inline)]
struct ClearResponse {
    /// The tables cleared, in deletion order
    cleared: Vec<String>,
}

/// Response for the seed endpoint.
#[derive(Serialize, JsonSchema)]
#[schemars(inline)]
struct SeedResponse {
    /// SKU of the inserted test product
    sku: String,
}

/// List every table and its columns.
///
/// # Returns
///
/// - `200 OK`: Table names mapped to their column lists
/// - `500 Internal Server Error`: Database query failed
async fn list_tables<T: Application>(
    State(app): State<T>,
) -> Result<Json<TablesResponse>, (StatusCode, String)> {
    let tables = app
        .database()
        .list_tables()
        .await
        .map_err(internal("failed to list tables"))?;

    Ok(Json(TablesResponse {
        count: tables.len(),
        tables,
    }))
}

/// Create the schema (run pending migrations).
///
/// # Returns
///
/// - `201 Created`: Tables exist at the current schema version
/// - `500 Internal Server Error`: Migration failed
async fn create_tables<T: Application>(
    State(app): State<T>,
) -> Result<(StatusCode, String), (StatusCode, String)> {
    app.database()
        .ensure_schema()
        .await
        .map(|_| (StatusCode::CREATED, "tables created".to_string()))
        .map_err(internal("failed to create tables"))
}

/// Row count of every table.
///
/// # Returns
///
/// - `200 OK`: Row count per table
/// - `500 Internal Server Error`: Database query failed
async fn table_counts<T: Application>(
    State(app): State<T>,
) -> Result<Json<TableCountsResponse>, (StatusCode, String)> {
    let table_counts = app
        .database()
        .table_counts()
        .await
        .map_err(internal("failed to count tables"))?;

    Ok(Json(TableCountsResponse { table_counts }))
}

/// Full dump of one table.
///
/// # Returns
///
/// - `200 OK`: Column names, row count and every row as JSON
/// - `404 Not Found`: Unknown table; the body lists the known tables
/// - `500 Internal Server Error`: Database query failed
async fn dump_table<T: Application>(
    State(app): State<T>,
    Path(TablePath { table }): Path<TablePath>,
) -> Result<Json<TableDump>, (StatusCode, String)> {
    let db = app.database();

    let dump = db
        .dump_table(&table)
        .await
        .map_err(internal("failed to dump table"))?;

    match dump {
        Some(dump) => Ok(Json(dump)),
        None => {
            let known = db
                .list_tables()
                .await
                .map_err(internal("failed to list tables"))?
                .into_iter()
                .map(|t| t.name)
                .collect::<Vec<_>>()
                .join(", ");
            Err((
                StatusCode::NOT_FOUND,
                format!("table {table:?} not found; known tables: {known}"),
            ))
        }
    }
}

/// Delete every row from every table.
///
/// # Returns
///
/// - `200 OK`: The tables cleared, in deletion order
/// - `500 Internal Server Error`: Database operation failed
async fn clear_tables<T: Application>(
    State(app): State<T>,
) -> Result<Json<ClearResponse>, (StatusCode, String)> {
    let cleared = app
        .database()
        .clear_tables()
        .await
        .map_err(internal("failed to clear tables"))?;

    Ok(Json(ClearResponse { cleared }))
}

/// Insert a throwaway test product with a randomized SKU.
///
/// # Returns
///
/// - `201 Created`: The SKU of the inserted product
/// - `500 Internal Server Error`: Database operation failed
async fn seed_test_product<T: Application>(
    State(app): State<T>,
) -> Result<(StatusCode, Json<SeedResponse>), (StatusCode, String)> {
    let sku = format!("TEST{}", rand::rng().random_range(100000..=999999));

    let product = Product {
        sku: sku.clone(),
        brand: Some("Test Brand".to_string()),
        category: Some("Test Category".to_string()),
        item_name: Some("Test Product".to_string()),
        size: Some("1 EA".to_string()),
    };

    app.database()
        .create_product(&product)
        .await
        .map_err(internal("failed to seed test product"))?;

    Ok((StatusCode::CREATED, Json(SeedResponse { sku })))
}
