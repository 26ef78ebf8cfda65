//! OpenAPI documentation generation and serving.
//!
//! This module provides endpoints for serving the auto-generated OpenAPI
//! specification and an interactive API documentation interface using RapiDoc.

use std::sync::Arc;

use aide::{
    axum::{ApiRouter, IntoApiResponse, routing::get},
    openapi::{OpenApi, Tag},
    transform::TransformOpenApi,
};
use axum::{
    Extension, Json,
    response::{Html, IntoResponse},
};

/// Serve the RapiDoc interactive API documentation interface.
async fn serve_rapidoc() -> impl IntoApiResponse {
    let html = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <script src="https://cdnjs.cloudflare.com/ajax/libs/rapidoc/9.3.8/rapidoc-min.js" integrity="sha512-0ES6eX4K9J1PrIEjIizv79dTlN5HwI2GW9Ku6ymb8dijMHF5CIplkS8N0iFJ/wl3GybCSqBJu8HDhiFkZRAf0g==" crossorigin="anonymous" referrerpolicy="no-referrer"></script>
  </head>
  <body>
    <rapi-doc spec-url="/docs/api.json"
        show-method-in-nav-bar="as-colored-text"
        use-path-in-nav-bar="true"
    ></rapi-doc>
  </body>
</html>"#;
    Html(html).into_response()
}

/// Creates a router for documentation endpoints.
pub(crate) fn docs_routes() -> ApiRouter {
    let router: ApiRouter = ApiRouter::new()
        .route("/", get(serve_rapidoc))
        .route("/api.json", get(serve_docs));

    router
}

/// Serve the raw OpenAPI specification.
async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
    Json(api).into_response()
}

/// Configure the OpenAPI documentation metadata.
pub(crate) fn api_docs(api: TransformOpenApi) -> TransformOpenApi {
    api.title("Vendor Pricing API")
        .summary("A REST API for ingesting vendor price lists and reviewing price proposals.")
        .description(
            "This API exposes database administration, ingestion cycle execution \
             and price proposal review for the vendor pricing service.",
        )
        .version("0.1")
        .tag(Tag {
            name: "admin".into(),
            description: Some("Database administration and inspection".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "cycle".into(),
            description: Some("Ingestion cycle execution and summaries".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "proposal".into(),
            description: Some("Price proposal review".into()),
            ..Default::default()
        })
}
