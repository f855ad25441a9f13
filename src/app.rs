//! Router assembly shared by the binary and the integration tests

use axum::http::{header, HeaderValue, Method};
use axum::{middleware::from_fn, routing::get, Router};
use std::path::Path;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::Config;
use crate::handlers::system;
use crate::middleware;
use crate::routes;
use crate::state::AppState;

/// Build the full application router
pub fn build_router(state: AppState, config: &Config) -> Router {
    let mut app = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .nest("/api", routes::api_routes())
        .with_state(state);

    if let Some(dir) = config.static_dir.as_deref() {
        tracing::info!(dir = %dir, "Serving static assets");
        let index = Path::new(dir).join("index.html");
        app = app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    let mut app = app
        .layer(from_fn(middleware::security_headers))
        .layer(from_fn(middleware::request_tracing))
        .layer(configure_cors(config.cors_allowed_origins.as_deref()));

    if config.environment.is_production() {
        app = app.layer(from_fn(middleware::hsts_header));
    }

    app
}

/// Credentialed CORS so the session cookie travels with browser requests
fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, mirroring request origins");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
