//! User administration handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use super::MaybePrincipal;
use crate::error::ApiError;
use crate::models::{
    MessageResponse, SuspendRequest, UpdateRoleRequest, UserResponse, UserSearchQuery,
};
use crate::state::AppState;

/// GET /api/users?search= - Admin listing
pub async fn list_users(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Query(query): Query<UserSearchQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state
        .user_service
        .list(session.principal(), query.search.as_deref())
        .await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/users/email/:email
pub async fn get_user_by_email(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_service
        .get_by_email(session.principal(), &email)
        .await?;
    Ok(Json(user.into()))
}

/// PATCH /api/users/:id/role
pub async fn update_role(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_service
        .set_role(session.principal(), id, req.role)
        .await?;
    Ok(Json(user.into()))
}

/// PATCH /api/users/:id/suspend - body is optional
pub async fn suspend_user(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Path(id): Path<Uuid>,
    body: Option<Json<SuspendRequest>>,
) -> Result<Json<UserResponse>, ApiError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let user = state
        .user_service
        .suspend(session.principal(), id, req)
        .await?;
    Ok(Json(user.into()))
}

/// PATCH /api/users/:id/activate
pub async fn activate_user(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_service
        .activate(session.principal(), id)
        .await?;
    Ok(Json(user.into()))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    session: MaybePrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.user_service.delete(session.principal(), id).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}
