//! HTTP router construction (spec §4.H), built the same way the
//! teacher's `router.rs` assembles an `axum::Router` with `.route(...)`
//! chains and a `CorsLayer`.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes;
use crate::state::AppState;

/// Build the complete application router (spec §4.H endpoint table).
///
/// CORS is permissive on origin (`Access-Control-Allow-Origin: *`, spec
/// §4.H) and exposes `Content-Length`/`Content-Range` so browser clients
/// can read pagination headers off cross-origin responses.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
        .expose_headers([header::CONTENT_LENGTH, header::CONTENT_RANGE]);

    Router::new()
        .route("/", get(routes::root))
        .route("/spec", get(routes::spec))
        .route("/jobs", get(routes::list_jobs).post(routes::create_job))
        .route("/jobs/{id}", get(routes::get_job).put(routes::update_job).delete(routes::delete_job))
        .route("/jobs/{id}/dry-run", get(routes::dry_run))
        .layer(cors)
        .with_state(state)
}
