//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum
//! server. Routes are nested under `/api/`, with a CORS layer for the
//! local dev origins the web UI is served from.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints;
use crate::state::AppState;

/// Dev origins allowed by CORS (the web UI and its Vite dev server).
const ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:5000",
    "http://127.0.0.1:5000",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
];

/// Build the API router with all routes under `/api/`.
pub fn api_router(state: Arc<AppState>) -> Router {
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route("/patients/:id", get(endpoints::patients::detail))
        .route(
            "/patients/:id/diagnoses",
            get(endpoints::diagnoses::for_patient),
        )
        .route("/diagnoses", get(endpoints::diagnoses::list))
        .route("/diagnoses/:id", get(endpoints::diagnoses::detail))
        .route("/analyze", post(endpoints::analyze::run))
        .route("/knowledge/search", get(endpoints::knowledge::search))
        .route("/snapshot", get(endpoints::snapshot::seed))
        .with_state(state);

    Router::new().nest("/api", routes).layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = ALLOWED_ORIGINS
        .iter()
        .map(|o| o.parse().expect("static origin is a valid header value"))
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
