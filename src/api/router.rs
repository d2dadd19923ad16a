//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::types::{ApiContext, MAX_BODY_BYTES};

/// Build the API router.
///
/// Every response carries `Cache-Control: no-store`: bodies hold patient notes.
pub fn api_router(ctx: ApiContext) -> Router {
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/handwriting/recognize",
            post(endpoints::handwriting::recognize),
        )
        .with_state(ctx);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
}
