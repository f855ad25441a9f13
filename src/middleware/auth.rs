//! Session extraction
//!
//! Resolves the caller's session token into an optional [`Principal`]. The
//! bearer header wins over the `token` cookie. A request without either is
//! anonymous; a token that is present but invalid or expired is rejected
//! outright.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::auth::{AuthService, Principal};
use crate::error::ApiError;

/// Name of the HTTP-only session cookie set at login
pub const SESSION_COOKIE: &str = "token";

/// Caller identity, if any. Authorization happens in the services.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(session: MaybePrincipal) -> impl IntoResponse {
///     service.profile(session.principal()).await
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MaybePrincipal(pub Option<Principal>);

impl MaybePrincipal {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybePrincipal
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = match session_token(parts, state).await {
            Some(token) => token,
            None => return Ok(MaybePrincipal(None)),
        };

        let auth_service = Arc::<AuthService>::from_ref(state);
        let principal = auth_service.authenticate(&token)?;

        Ok(MaybePrincipal(Some(principal)))
    }
}

async fn session_token<S>(parts: &mut Parts, state: &S) -> Option<String>
where
    S: Send + Sync,
{
    if let Ok(Some(TypedHeader(Authorization(bearer)))) =
        Option::<TypedHeader<Authorization<Bearer>>>::from_request_parts(parts, state).await
    {
        return Some(bearer.token().to_string());
    }

    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
