//! Loan catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::MaybePrincipal;
use crate::error::ApiError;
use crate::models::{
    CreateLoanOfferRequest, LoanOffer, LoanOfferPatch, MessageResponse, PaginationParams,
    ShowOnHomeRequest,
};
use crate::state::AppState;

/// GET /api/loans?limit=&page= - Public catalog
pub async fn list_loans(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<Vec<LoanOffer>>, ApiError> {
    Ok(Json(state.loan_service.list(pagination).await?))
}

/// GET /api/loans/home
pub async fn home_loans(State(state): State<AppState>) -> Result<Json<Vec<LoanOffer>>, ApiError> {
    Ok(Json(state.loan_service.home().await?))
}

/// GET /api/loans/mine - Manager's own offers
pub async fn my_loans(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<Vec<LoanOffer>>, ApiError> {
    Ok(Json(
        state
            .loan_service
            .mine(session.principal(), pagination)
            .await?,
    ))
}

/// GET /api/loans/all - Admin view of every offer
pub async fn all_loans(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<Vec<LoanOffer>>, ApiError> {
    Ok(Json(
        state
            .loan_service
            .all(session.principal(), pagination)
            .await?,
    ))
}

/// GET /api/loans/:id
pub async fn get_loan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LoanOffer>, ApiError> {
    Ok(Json(state.loan_service.get(id).await?))
}

/// POST /api/loans
pub async fn create_loan(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Json(req): Json<CreateLoanOfferRequest>,
) -> Result<(StatusCode, Json<LoanOffer>), ApiError> {
    let offer = state
        .loan_service
        .create(session.principal(), req)
        .await?;
    Ok((StatusCode::CREATED, Json(offer)))
}

/// PATCH /api/loans/:id
pub async fn update_loan(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Path(id): Path<Uuid>,
    Json(patch): Json<LoanOfferPatch>,
) -> Result<Json<LoanOffer>, ApiError> {
    Ok(Json(
        state
            .loan_service
            .update(session.principal(), id, patch)
            .await?,
    ))
}

/// PATCH /api/loans/:id/show-on-home
pub async fn set_show_on_home(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Path(id): Path<Uuid>,
    Json(req): Json<ShowOnHomeRequest>,
) -> Result<Json<LoanOffer>, ApiError> {
    Ok(Json(
        state
            .loan_service
            .set_show_on_home(session.principal(), id, req.show_on_home)
            .await?,
    ))
}

/// DELETE /api/loans/:id
pub async fn delete_loan(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.loan_service.delete(session.principal(), id).await?;
    Ok(Json(MessageResponse::new("Loan offer deleted")))
}
