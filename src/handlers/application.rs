//! Loan application handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::MaybePrincipal;
use crate::error::ApiError;
use crate::models::{
    CreateApplicationRequest, ListApplicationsQuery, LoanApplication, PaginationParams,
    PayFeeRequest,
};
use crate::state::AppState;

/// POST /api/applications
pub async fn create_application(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Json(req): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<LoanApplication>), ApiError> {
    let application = state
        .application_service
        .create(session.principal(), req)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/applications?email=&status=&page=&limit= - Review listing
pub async fn list_applications(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Query(query): Query<ListApplicationsQuery>,
) -> Result<Json<Vec<LoanApplication>>, ApiError> {
    Ok(Json(
        state
            .application_service
            .list(session.principal(), query)
            .await?,
    ))
}

/// GET /api/applications/mine
pub async fn my_applications(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<Vec<LoanApplication>>, ApiError> {
    Ok(Json(
        state
            .application_service
            .mine(session.principal(), pagination)
            .await?,
    ))
}

/// GET /api/applications/:id
pub async fn get_application(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<LoanApplication>, ApiError> {
    Ok(Json(
        state
            .application_service
            .get(session.principal(), id)
            .await?,
    ))
}

/// PATCH /api/applications/:id/approve
pub async fn approve_application(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<LoanApplication>, ApiError> {
    Ok(Json(
        state
            .application_service
            .approve(session.principal(), id)
            .await?,
    ))
}

/// PATCH /api/applications/:id/reject
pub async fn reject_application(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<LoanApplication>, ApiError> {
    Ok(Json(
        state
            .application_service
            .reject(session.principal(), id)
            .await?,
    ))
}

/// PATCH /api/applications/:id/cancel
pub async fn cancel_application(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<LoanApplication>, ApiError> {
    Ok(Json(
        state
            .application_service
            .cancel(session.principal(), id)
            .await?,
    ))
}

/// PATCH /api/applications/:id/pay - Record the application fee
pub async fn pay_application_fee(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Path(id): Path<Uuid>,
    Json(req): Json<PayFeeRequest>,
) -> Result<Json<LoanApplication>, ApiError> {
    Ok(Json(
        state
            .application_service
            .pay_fee(session.principal(), id, req)
            .await?,
    ))
}
