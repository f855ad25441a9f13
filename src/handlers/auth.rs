//! Authentication HTTP handlers

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::MaybePrincipal;
use crate::auth::TOKEN_TTL_SECONDS;
use crate::error::ApiError;
use crate::middleware::SESSION_COOKIE;
use crate::models::{
    AuthTokenResponse, LoginRequest, MessageResponse, RegisterRequest, UserResponse,
};
use crate::state::AppState;

/// POST /api/auth/register - Create a borrower account
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state.auth_service.register(req).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/auth/login - Issue a session token and set the session cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthTokenResponse>), ApiError> {
    let (user, token) = state.auth_service.login(req).await?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .http_only(true)
        .secure(state.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/");

    Ok((
        jar.add(cookie),
        Json(AuthTokenResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: TOKEN_TTL_SECONDS,
            user: user.into(),
        }),
    ))
}

/// POST /api/auth/logout - Clear the session cookie
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(MessageResponse::new("Logged out")),
    )
}

/// GET /api/auth/me - Current user's profile
pub async fn me(
    State(state): State<AppState>,
    session: MaybePrincipal,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.user_service.profile(session.principal()).await?;
    Ok(Json(user.into()))
}
