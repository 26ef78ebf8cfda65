#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod admin_routes;
mod cycle_routes;
mod proposal_routes;

use aide::{
    axum::{ApiRouter, routing::get},
    openapi::OpenApi,
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use schemars::JsonSchema;
use serde::Serialize;
use std::sync::Arc;
use tracing::{Level, event};
use vp_core::ports::{AdminRepository as _, Application};

mod openapi;
use openapi::{api_docs, docs_routes};

pub mod config;
use config::AxumConfig;

/// Response for the health check endpoint
#[derive(Serialize, JsonSchema)]
#[schemars(inline)]
struct HealthResponse {
    status: String,
    database: String,
}

/// Health check: process liveness plus a database round trip.
async fn health_check<T: Application>(State(app): State<T>) -> Json<HealthResponse> {
    let database = match app.database().ping().await {
        Ok(()) => "connected",
        Err(err) => {
            event!(Level::ERROR, err = err.to_string());
            "unavailable"
        }
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        database: database.to_string(),
    })
}

/// Construct a full API router with the given state and config
pub fn router<T: Application>(state: T, config: AxumConfig) -> axum::Router {
    let mut api = OpenApi::default();
    ApiRouter::new()
        .api_route("/health", get(health_check::<T>))
        .nest("/admin", admin_routes::router())
        .nest("/cycle", cycle_routes::router())
        .nest("/proposal", proposal_routes::router())
        .nest_api_service("/docs", docs_routes())
        .finish_api_with(&mut api, api_docs)
        .layer(Extension(Arc::new(api))) // Arc is very important here or you will face massive memory and performance issues
        .layer(Extension(Arc::new(config)))
        .with_state(state)
}

/// Starts the HTTP server with the provided configuration
pub async fn start_server<T: Application>(
    config: AxumConfig,
    app: T,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .expect("Unable to bind to address");

    tracing::info!(
        "Listening for requests on {}",
        listener.local_addr().unwrap()
    );

    let service = router(app, config);
    axum::serve(listener, service).await
}

/// Shared 500 mapping: log the backend error, surface a terse message.
pub(crate) fn internal<E: std::fmt::Display>(
    message: &'static str,
) -> impl FnOnce(E) -> (StatusCode, String) {
    move |err| {
        event!(Level::ERROR, err = err.to_string());
        (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
    }
}
