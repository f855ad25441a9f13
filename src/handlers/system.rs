//! Banner, health and EMI calculator

use axum::{
    extract::{OriginalUri, State},
    Json,
};
use serde::Serialize;

use crate::error::ApiError;
use crate::services::emi::{self, EmiBreakdown, EmiRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /
pub async fn root() -> &'static str {
    "LoanLink server is running"
}

/// GET /health - Pings the store
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    state.health.ping().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// Unknown `/api` paths answer with a JSON 404 instead of the SPA shell
pub async fn api_not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(format!("No API route for {}", uri.path()))
}

/// POST /api/emi/calculate
pub async fn calculate_emi(Json(req): Json<EmiRequest>) -> Result<Json<EmiBreakdown>, ApiError> {
    Ok(Json(emi::calculate(&req)?))
}
